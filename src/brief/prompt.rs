//! Prompt text for the brief generator.

use serde::Serialize;

use super::BriefMode;
use crate::item::Item;
use crate::timestamp::iso;

pub const SYSTEM_PROMPT: &str = "You are an editorial analyst for a power and energy \
infrastructure news site covering transmission, grid, substations, HVDC, renewables, \
storage, oil and gas, data centers, AI and chips, and critical minerals. Work only from \
the feed items provided (headline and metadata). Do not add outside facts, do not quote \
article text, and skip items outside that focus. Be concise and structured.";

#[derive(Serialize)]
struct PromptItem<'a> {
    title: &'a str,
    publisher: &'a str,
    category: &'a str,
    published: String,
    score: f64,
    #[serde(rename = "type")]
    item_type: &'static str,
    url: &'a str,
}

fn items_json(items: &[Item]) -> String {
    let compact: Vec<PromptItem<'_>> = items
        .iter()
        .map(|it| PromptItem {
            title: &it.title,
            publisher: &it.publisher,
            category: it.category.as_deref().unwrap_or(""),
            published: iso(&it.published),
            score: it.score,
            item_type: it.item_type.as_str(),
            url: &it.url,
        })
        .collect();
    serde_json::to_string_pretty(&compact).unwrap_or_else(|_| "[]".to_string())
}

/// User prompt for one window.
pub fn build_prompt(label: &str, mode: BriefMode, items: &[Item]) -> String {
    let body = items_json(items);
    match mode {
        BriefMode::Forecast => format!(
            "Write a \"{label}\" from the feed items below.\n\n\
             This is a watch list inferred from headline signals, not a prediction.\n\n\
             Markdown sections:\n\
             1) Themes likely to stay active (up to 6 bullets, phrased as things to watch)\n\
             2) What to monitor next, by sector (Grid, Renewables, Oil & Gas, Data Centers & AI, \
             Chips & Supply Chain, Critical Minerals), only where the items support it\n\
             3) Regions or companies that recur in the headlines\n\
             4) Risks or constraints the headlines imply (up to 5 bullets)\n\n\
             Never state future events as facts. When a headline is too thin, say \
             \"Not enough information in the headline.\"\n\n\
             Feed items (JSON):\n{body}\n"
        ),
        BriefMode::Brief => format!(
            "Write the \"{label}\" intelligence brief from the feed items below.\n\n\
             Each item has headline, publisher, category, timestamp, score, type and url.\n\n\
             Markdown sections:\n\
             1) Top themes (up to 6 bullets)\n\
             2) Top stories (up to 10), one sentence each, ending with (Source: Publisher)\n\
             3) Sector takeaways (Grid, Renewables, Oil & Gas, Data Centers & AI, \
             Chips & Supply Chain, Critical Minerals), only where relevant\n\
             4) Companies or regions named in the headlines\n\n\
             When a headline is too thin, say \"Not enough information in the headline.\"\n\n\
             Feed items (JSON):\n{body}\n"
        ),
    }
}
