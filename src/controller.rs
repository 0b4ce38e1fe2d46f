use std::collections::BTreeMap;

use crate::{
    data::{Category, Restaurant},
    db::{RatingsStore, Storage},
    popup::{template_popup, RATING_VALUES},
    selection::SelectionCache,
};

// Host failures never reach the user; log them and keep going.
macro_rules! report {
    ($result:expr, $what:literal) => {
        if let Err(e) = $result {
            tracing::error!("fail to {}: {e:#}", $what)
        }
    };
}

/// Whatever the popup surface needs to do on the controller's behalf.
pub trait PopupHost {
    /// Show `html` as the popup of `restaurant`, replacing any current content,
    /// and attach click handling to the new fragment once it is mounted.
    fn show(&mut self, restaurant: &Restaurant, html: &str) -> anyhow::Result<()>;

    /// Set `data-checked` on every rating button of `restaurant_id` from `picks`.
    fn render_selection(
        &mut self,
        restaurant_id: &str,
        picks: &BTreeMap<Category, u8>,
    ) -> anyhow::Result<()>;
}

/// The data attributes of the button a click landed on.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ClickTarget {
    pub action: Option<String>,
    pub category: Option<String>,
    pub value: Option<String>,
    pub rating_input: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Submit,
    Clear,
    Select { category: Category, value: u8 },
}

impl Action {
    pub fn new(target: &ClickTarget) -> Result<Self, &'static str> {
        match target.action.as_deref() {
            Some("submit") => return Ok(Self::Submit),
            Some("clear") => return Ok(Self::Clear),
            Some(_) => return Err("unexpected action"),
            None => (),
        }

        if !target.rating_input {
            return Err("not a popup control");
        }
        let Some(Ok(category)) = target.category.as_deref().map(str::parse::<Category>) else {
            return Err("unknown category");
        };
        let Some(Ok(value)) = target.value.as_deref().map(str::parse::<u8>) else {
            return Err("can not parse rating value");
        };
        if !RATING_VALUES.contains(&value) {
            return Err("rating value out of range");
        }

        Ok(Self::Select { category, value })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    /// New state of the toggled key.
    Selected(Option<u8>),
    Cleared,
    Submitted { accepted: usize },
    NothingSelected,
}

/// Turns popup clicks into selection changes and rating submissions.
///
/// The selection cache is owned here rather than living in a global, so each
/// controller is an independent page session.
pub struct InteractionController<S> {
    store: RatingsStore<S>,
    selection: SelectionCache,
}

impl<S: Storage> InteractionController<S> {
    pub fn new(store: RatingsStore<S>) -> Self {
        Self {
            store,
            selection: SelectionCache::default(),
        }
    }

    pub fn store(&self) -> &RatingsStore<S> {
        &self.store
    }

    pub fn selection(&self) -> &SelectionCache {
        &self.selection
    }

    pub fn render(&self, restaurant: &Restaurant) -> String {
        let id = restaurant.id.as_str();
        template_popup(
            restaurant,
            &self.store.stats_for(id),
            &self.selection.picks_for(id),
        )
    }

    /// Marker click: render fresh stats and pending picks and hand them to the host.
    pub fn open(&mut self, host: &mut impl PopupHost, restaurant: &Restaurant) {
        let html = self.render(restaurant);
        report!(host.show(restaurant, &html), "open popup");
    }

    /// Entry point for raw clicks. Clicks on anything that is not a popup
    /// control are ignored.
    pub fn click(
        &mut self,
        host: &mut impl PopupHost,
        restaurant: &Restaurant,
        target: &ClickTarget,
    ) -> Option<Outcome> {
        match Action::new(target) {
            Ok(action) => Some(self.handle(host, restaurant, action)),
            Err(reason) => {
                tracing::trace!(restaurant = %restaurant.id, reason, "ignoring click");
                None
            }
        }
    }

    pub fn handle(
        &mut self,
        host: &mut impl PopupHost,
        restaurant: &Restaurant,
        action: Action,
    ) -> Outcome {
        let id = restaurant.id.as_str();
        match action {
            Action::Select { category, value } => {
                let state = self.selection.toggle(id, category, value);
                report!(
                    host.render_selection(id, &self.selection.picks_for(id)),
                    "render selection"
                );
                Outcome::Selected(state)
            }
            Action::Clear => {
                self.selection.clear_restaurant(id);
                report!(
                    host.render_selection(id, &BTreeMap::new()),
                    "render selection"
                );
                Outcome::Cleared
            }
            Action::Submit => {
                let picks = self.selection.picks_for(id);
                if picks.is_empty() {
                    return Outcome::NothingSelected;
                }

                let accepted = self.store.add_ratings(id, picks);
                tracing::info!(restaurant = id, accepted, "ratings submitted");
                self.selection.clear_restaurant(id);

                let html = self.render(restaurant);
                report!(host.show(restaurant, &html), "re-render popup");
                Outcome::Submitted { accepted }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStorage, STORAGE_KEY};

    #[derive(Default)]
    struct RecordingHost {
        shown: Vec<(String, String)>,
        rendered: Vec<(String, BTreeMap<Category, u8>)>,
    }

    impl PopupHost for RecordingHost {
        fn show(&mut self, restaurant: &Restaurant, html: &str) -> anyhow::Result<()> {
            self.shown.push((restaurant.id.clone(), html.to_string()));
            Ok(())
        }

        fn render_selection(
            &mut self,
            restaurant_id: &str,
            picks: &BTreeMap<Category, u8>,
        ) -> anyhow::Result<()> {
            self.rendered.push((restaurant_id.to_string(), picks.clone()));
            Ok(())
        }
    }

    struct FailingHost;

    impl PopupHost for FailingHost {
        fn show(&mut self, _: &Restaurant, _: &str) -> anyhow::Result<()> {
            anyhow::bail!("popup element is gone")
        }

        fn render_selection(&mut self, _: &str, _: &BTreeMap<Category, u8>) -> anyhow::Result<()> {
            anyhow::bail!("popup element is gone")
        }
    }

    fn controller() -> InteractionController<MemoryStorage> {
        InteractionController::new(RatingsStore::new(MemoryStorage::default(), STORAGE_KEY))
    }

    fn rating(category: &str, value: &str) -> ClickTarget {
        ClickTarget {
            category: Some(category.to_string()),
            value: Some(value.to_string()),
            rating_input: true,
            ..Default::default()
        }
    }

    fn action(name: &str) -> ClickTarget {
        ClickTarget {
            action: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_action() {
        assert_eq!(Action::new(&action("submit")), Ok(Action::Submit));
        assert_eq!(Action::new(&action("clear")), Ok(Action::Clear));
        assert_eq!(
            Action::new(&rating("ice cream", "5")),
            Ok(Action::Select {
                category: Category::IceCream,
                value: 5
            })
        );
        assert!(Action::new(&action("delete")).is_err());
        assert!(Action::new(&ClickTarget::default()).is_err());
        assert!(Action::new(&rating("tea", "3")).is_err());
        assert!(Action::new(&rating("coffee", "6")).is_err());
        assert!(Action::new(&rating("coffee", "x")).is_err());
        assert!(Action::new(&ClickTarget {
            rating_input: false,
            ..rating("coffee", "3")
        })
        .is_err());
    }

    #[test]
    fn test_select_renders_selection() {
        let mut ctl = controller();
        let mut host = RecordingHost::default();
        let r = Restaurant::new("rst-1", "Safari Bites", 0.0, 0.0);

        assert_eq!(
            ctl.click(&mut host, &r, &rating("coffee", "4")),
            Some(Outcome::Selected(Some(4)))
        );
        assert_eq!(
            ctl.click(&mut host, &r, &rating("coffee", "4")),
            Some(Outcome::Selected(None))
        );
        assert_eq!(host.rendered.len(), 2);
        assert_eq!(host.rendered[0].1.get(&Category::Coffee), Some(&4));
        assert!(host.rendered[1].1.is_empty());
    }

    #[test]
    fn test_submit_without_selection_is_noop() {
        let mut ctl = controller();
        let mut host = RecordingHost::default();
        let r = Restaurant::new("rst-1", "Safari Bites", 0.0, 0.0);

        assert_eq!(
            ctl.handle(&mut host, &r, Action::Submit),
            Outcome::NothingSelected
        );
        assert!(host.shown.is_empty());
        assert_eq!(ctl.store().storage().get_item(STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn test_submit_only_takes_own_restaurant() {
        let mut ctl = controller();
        let mut host = RecordingHost::default();
        let a = Restaurant::new("rst-1", "Safari Bites", 0.0, 0.0);
        let b = Restaurant::new("rst-2", "Elephant Grounds", 0.0, 0.0);

        ctl.click(&mut host, &a, &rating("waffle", "2"));
        ctl.click(&mut host, &b, &rating("waffle", "5"));
        assert_eq!(
            ctl.handle(&mut host, &a, Action::Submit),
            Outcome::Submitted { accepted: 1 }
        );

        assert_eq!(ctl.store().stats_for("rst-2").get(Category::Waffle).count, 0);
        assert_eq!(ctl.selection().get("rst-2", Category::Waffle), Some(5));
        assert!(ctl.selection().is_empty_for("rst-1"));

        let (id, html) = host.shown.last().unwrap();
        assert_eq!(id, "rst-1");
        assert!(html.contains("<tr><th>Waffle</th><td>2 ★</td><td>1 vote</td></tr>"));
    }

    #[test]
    fn test_clear_keeps_other_restaurants() {
        let mut ctl = controller();
        let mut host = RecordingHost::default();
        let a = Restaurant::new("A", "A", 0.0, 0.0);
        let b = Restaurant::new("B", "B", 0.0, 0.0);

        ctl.click(&mut host, &b, &rating("other", "1"));
        ctl.click(&mut host, &a, &rating("other", "3"));
        assert_eq!(ctl.click(&mut host, &a, &action("clear")), Some(Outcome::Cleared));

        assert!(ctl.selection().is_empty_for("A"));
        assert_eq!(ctl.selection().get("B", Category::Other), Some(1));
        assert_eq!(host.rendered.last().unwrap(), &("A".to_string(), BTreeMap::new()));
    }

    #[test]
    fn test_reopen_marks_pending_picks() {
        let mut ctl = controller();
        let mut host = RecordingHost::default();
        let a = Restaurant::new("rst-1", "Safari Bites", 0.0, 0.0);
        let b = Restaurant::new("rst-2", "Elephant Grounds", 0.0, 0.0);

        ctl.open(&mut host, &a);
        ctl.click(&mut host, &a, &rating("casserole", "3"));
        ctl.open(&mut host, &b);
        ctl.open(&mut host, &a);

        let (_, html) = host.shown.last().unwrap();
        assert_eq!(html.matches(r#"data-checked="true""#).count(), 1);
        assert!(html.contains(r#"data-category="casserole" data-value="3" data-checked="true""#));

        let (_, html) = &host.shown[1];
        assert!(!html.contains(r#"data-checked="true""#));
    }

    #[test]
    fn test_host_failures_do_not_abort() {
        let mut ctl = controller();
        let r = Restaurant::new("rst-1", "Safari Bites", 0.0, 0.0);

        ctl.open(&mut FailingHost, &r);
        ctl.handle(
            &mut FailingHost,
            &r,
            Action::Select {
                category: Category::Coffee,
                value: 3,
            },
        );
        assert_eq!(
            ctl.handle(&mut FailingHost, &r, Action::Submit),
            Outcome::Submitted { accepted: 1 }
        );
        assert_eq!(ctl.store().stats_for("rst-1").get(Category::Coffee).count, 1);
    }
}
