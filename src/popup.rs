//! HTML for a restaurant popup: current averages plus the rating controls.
//!
//! Everything that ends up inside markup goes through [`escape_html`], since
//! restaurant names come from configuration the page author controls.

use std::collections::BTreeMap;

use crate::{
    data::{Category, Restaurant},
    db::{CategoryStats, RestaurantStats},
};

pub const RATING_VALUES: [u8; 5] = [1, 2, 3, 4, 5];

const MISSING_AVERAGE: &str = "—";

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Uppercase every lowercase ASCII letter that starts the string or follows whitespace.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut word_start = true;
    for ch in s.chars() {
        if word_start && ch.is_ascii_lowercase() {
            out.push(ch.to_ascii_uppercase());
        } else {
            out.push(ch);
        }
        word_start = ch.is_whitespace();
    }
    out
}

/// Grouping name shared by the five buttons of one (restaurant, category) row.
pub fn group_name(restaurant_id: &str, category: Category) -> String {
    format!("rate-{restaurant_id}-{category}")
}

fn stats_row(category: Category, stats: CategoryStats) -> String {
    let avg = match stats.avg {
        Some(avg) => format!("{avg} ★"),
        None => MISSING_AVERAGE.to_string(),
    };
    let plural = if stats.count == 1 { "" } else { "s" };
    format!(
        "<tr><th>{}</th><td>{avg}</td><td>{} vote{plural}</td></tr>",
        escape_html(&title_case(category.label())),
        stats.count,
    )
}

/// Whether the button `value` of `category` shows as picked.
pub fn is_checked(picks: &BTreeMap<Category, u8>, category: Category, value: u8) -> bool {
    picks.get(&category) == Some(&value)
}

fn rating_row(restaurant_id: &str, category: Category, picks: &BTreeMap<Category, u8>) -> String {
    let id = escape_html(restaurant_id);
    let name = escape_html(&group_name(restaurant_id, category));
    let label = escape_html(category.label());

    let buttons: String = RATING_VALUES
        .iter()
        .map(|&v| {
            let checked = is_checked(picks, category, v);
            format!(
                r#"<button type="button" class="rating-input" data-name="{name}" data-restaurant-id="{id}" data-category="{label}" data-value="{v}" data-checked="{checked}"><span>{v}</span></button>"#
            )
        })
        .collect();

    format!(
        r#"<div class="category"><label>{}</label><div class="ratings-row" role="radiogroup" aria-label="{label}">{buttons}</div></div>"#,
        escape_html(&title_case(category.label())),
    )
}

/// Render the popup for `restaurant` from already computed stats and the
/// restaurant's pending picks.
pub fn template_popup(
    restaurant: &Restaurant,
    stats: &RestaurantStats,
    picks: &BTreeMap<Category, u8>,
) -> String {
    let stats_rows: String = stats.iter().map(|(c, s)| stats_row(c, s)).collect();
    let inputs: String = Category::ALL
        .into_iter()
        .map(|c| rating_row(&restaurant.id, c, picks))
        .collect();

    format!(
        r#"
<div class="popup-container" data-restaurant-id="{id}">
  <h3 class="popup-title">{name}</h3>
  <div class="popup-section stats">
    <table>
      <thead><tr><th>Category</th><th>Avg</th><th>Votes</th></tr></thead>
      <tbody>{stats_rows}</tbody>
    </table>
  </div>
  <div class="popup-section">
    {inputs}
    <div class="actions">
      <button type="button" class="button" data-action="submit">Submit Selected Ratings</button>
      <button type="button" class="button secondary" data-action="clear">Clear Selections</button>
    </div>
  </div>
</div>
"#,
        id = escape_html(&restaurant.id),
        name = escape_html(&restaurant.name),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStorage, RatingsStore, STORAGE_KEY};

    fn render(restaurant: &Restaurant, store: &RatingsStore<MemoryStorage>) -> String {
        template_popup(restaurant, &store.stats_for(&restaurant.id), &BTreeMap::new())
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#039;s&lt;/a&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("ice cream"), "Ice Cream");
        assert_eq!(title_case("coffee"), "Coffee");
        assert_eq!(title_case("already Fine"), "Already Fine");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_name_is_escaped() {
        let store = RatingsStore::new(MemoryStorage::default(), STORAGE_KEY);
        let r = Restaurant::new("rst-x", "<script>alert(1)</script>", 0.0, 0.0);
        let html = render(&r, &store);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    }

    #[test]
    fn test_empty_stats_use_placeholder() {
        let store = RatingsStore::new(MemoryStorage::default(), STORAGE_KEY);
        let r = Restaurant::new("rst-1", "Safari Bites", 0.0, 0.0);
        let html = render(&r, &store);
        assert!(html.contains("<tr><th>Ice Cream</th><td>—</td><td>0 votes</td></tr>"));
        assert!(!html.contains("★"));
    }

    #[test]
    fn test_stats_wording() {
        let mut store = RatingsStore::new(MemoryStorage::default(), STORAGE_KEY);
        store.add_ratings("rst-1", [(Category::Coffee, 4u8)]);
        store.add_ratings("rst-1", [(Category::Waffle, 4u8), (Category::Waffle, 5u8)]);
        let r = Restaurant::new("rst-1", "Safari Bites", 0.0, 0.0);
        let html = render(&r, &store);
        assert!(html.contains("<tr><th>Coffee</th><td>4 ★</td><td>1 vote</td></tr>"));
        assert!(html.contains("<tr><th>Waffle</th><td>4.5 ★</td><td>2 votes</td></tr>"));
    }

    #[test]
    fn test_controls() {
        let store = RatingsStore::new(MemoryStorage::default(), STORAGE_KEY);
        let r = Restaurant::new("rst-3", "Penguin Scoop", 0.0, 0.0);
        let html = render(&r, &store);

        assert_eq!(html.matches(r#"class="rating-input""#).count(), 25);
        assert!(html.contains(
            r#"data-name="rate-rst-3-ice cream" data-restaurant-id="rst-3" data-category="ice cream" data-value="5""#
        ));
        assert!(html.contains(r#"data-action="submit""#));
        assert!(html.contains(r#"data-action="clear""#));
        assert!(html.contains(r#"<div class="popup-container" data-restaurant-id="rst-3">"#));
    }

    #[test]
    fn test_pending_picks_are_checked() {
        let store = RatingsStore::new(MemoryStorage::default(), STORAGE_KEY);
        let r = Restaurant::new("rst-2", "Elephant Grounds", 0.0, 0.0);
        let picks = BTreeMap::from([(Category::Coffee, 4), (Category::Other, 1)]);
        let html = template_popup(&r, &store.stats_for(&r.id), &picks);

        assert_eq!(html.matches(r#"data-checked="true""#).count(), 2);
        assert!(html.contains(r#"data-category="coffee" data-value="4" data-checked="true""#));
        assert!(html.contains(r#"data-category="other" data-value="1" data-checked="true""#));
        assert!(html.contains(r#"data-category="coffee" data-value="3" data-checked="false""#));
    }

    #[test]
    fn test_is_checked() {
        let picks = BTreeMap::from([(Category::Waffle, 2)]);
        assert!(is_checked(&picks, Category::Waffle, 2));
        assert!(!is_checked(&picks, Category::Waffle, 3));
        assert!(!is_checked(&picks, Category::Coffee, 2));
    }
}
