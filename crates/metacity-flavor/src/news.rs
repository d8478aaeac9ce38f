//! Real-world headlines that seed the city newspaper.
//!
//! There is no live feed; a fixed set of stories keeps prompts
//! reproducible.

use serde::Serialize;

/// A real-world story the headline prompt may reinterpret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsItem {
    /// Story title.
    pub title: &'static str,
    /// Link to the story.
    pub url: &'static str,
}

/// Today's real-world headlines.
pub fn real_world_headlines() -> Vec<NewsItem> {
    vec![
        NewsItem {
            title: "Global Stock Markets Rally on Tech Sector Growth",
            url: "https://example.com/news1",
        },
        NewsItem {
            title: "Breakthrough in Renewable Energy Storage Announced",
            url: "https://example.com/news2",
        },
        NewsItem {
            title: "International Arts Festival Draws Record Crowds",
            url: "https://example.com/news3",
        },
    ]
}
