use std::sync::LazyLock;

use log::warn;
use scraper::{ElementRef, Html, Selector};
use crate::models::{FlashMessage, PageSnapshot, SemesterSummaryItem};

static CGPA_DISPLAY: LazyLock<Selector> = LazyLock::new(|| css("#cumulative-gpa-display"));
static SUMMARY_LIST: LazyLock<Selector> = LazyLock::new(|| css("#session-summary ul"));
static PART_OPTIONS: LazyLock<Selector> = LazyLock::new(|| css("#part-select option"));
static SEMESTER_OPTIONS: LazyLock<Selector> = LazyLock::new(|| css("#semester-select option"));
static FLASHES: LazyLock<Selector> = LazyLock::new(|| css(".flash, .flash-message, .alert"));

const FLASH_CATEGORIES: [&str; 5] = ["error", "danger", "warning", "success", "info"];

fn css(selector: &str) -> Selector {
    Selector::parse(selector).expect("static selector")
}

// Reads the state the server rendered into the form page. Missing or broken
// attributes fall back to an empty calculation rather than failing the page.
pub fn parse_page(html_content: &str) -> PageSnapshot {
    let document = Html::parse_document(html_content);

    let initial_cgpa = document
        .select(&CGPA_DISPLAY)
        .next()
        .and_then(|el| el.value().attr("data-initial-cgpa"))
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|cgpa| cgpa.is_finite())
        .unwrap_or(0.0);

    let initial_summary = document
        .select(&SUMMARY_LIST)
        .next()
        .and_then(|el| el.value().attr("data-initial-summary"))
        .map(parse_summary)
        .unwrap_or_default();

    PageSnapshot {
        initial_cgpa,
        initial_summary,
        part_options: option_values(document.select(&PART_OPTIONS)),
        semester_options: option_values(document.select(&SEMESTER_OPTIONS)),
        flash: document.select(&FLASHES).filter_map(flash_message).last(),
    }
}

// Flashes render as e.g. `<div class="flash error">` or `<div class="alert alert-error">`.
fn flash_message(element: ElementRef<'_>) -> Option<FlashMessage> {
    let message = element.text().collect::<Vec<_>>().join(" ");
    let message = message.split_whitespace().collect::<Vec<_>>().join(" ");
    if message.is_empty() {
        return None;
    }
    let category = element
        .value()
        .classes()
        .map(|class| class.rsplit('-').next().unwrap_or(class))
        .find(|class| FLASH_CATEGORIES.contains(class))
        .unwrap_or("info")
        .to_string();
    Some(FlashMessage { message, category })
}

fn parse_summary(raw: &str) -> Vec<SemesterSummaryItem> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str(raw) {
        Ok(items) => items,
        Err(e) => {
            warn!("Ignoring malformed initial summary: {}", e);
            Vec::new()
        }
    }
}

// Placeholder options have an empty value; a template listing part/semester pairs repeats values.
fn option_values<'a>(options: impl Iterator<Item = ElementRef<'a>>) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();
    for option in options {
        let value = match option.value().attr("value") {
            Some(value) => value.trim().to_string(),
            None => option.text().collect::<String>().trim().to_string(),
        };
        if !value.is_empty() && !values.contains(&value) {
            values.push(value);
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <select id="part-select">
            <option value="">Select Part</option>
            <option value="1">Part 1</option>
            <option value="2">Part 2</option>
          </select>
          <select id="semester-select">
            <option value="">Select Semester</option>
            <option value="Harmattan">Harmattan</option>
            <option value="Rain">Rain</option>
            <option value="Harmattan">Harmattan</option>
          </select>
          <span id="cumulative-gpa-display" data-initial-cgpa="3.87">0.00</span>
          <div id="session-summary">
            <ul data-initial-summary='[{"part": "1", "semester": "Harmattan", "gpa": 4.2}, {"part": "1", "semester": "Rain", "gpa": 3.55}]'></ul>
          </div>
        </body></html>
    "#;

    #[test]
    fn reads_initial_state_and_options() {
        let page = parse_page(PAGE);
        assert_eq!(page.initial_cgpa, 3.87);
        assert_eq!(page.initial_summary.len(), 2);
        assert_eq!(page.initial_summary[1].semester, "Rain");
        assert_eq!(page.part_options, vec!["1", "2"]);
        assert_eq!(page.semester_options, vec!["Harmattan", "Rain"]);
        assert_eq!(page.flash, None);
    }

    #[test]
    fn reads_flashed_message_and_category() {
        let html = r#"
            <div class="flash error">
              Calculation not found.
            </div>
        "#;
        let flash = parse_page(html).flash.unwrap();
        assert_eq!(flash.message, "Calculation not found.");
        assert!(flash.is_error());

        let html = r#"<div class="alert alert-success">Calculation 9f1c2d3e... loaded successfully.</div>"#;
        let flash = parse_page(html).flash.unwrap();
        assert_eq!(flash.category, "success");
        assert!(!flash.is_error());
    }

    #[test]
    fn entity_encoded_summary_is_decoded() {
        let html = r#"<div id="session-summary"><ul data-initial-summary="[{&#34;part&#34;: &#34;2&#34;, &#34;semester&#34;: &#34;Rain&#34;, &#34;gpa&#34;: 2.5}]"></ul></div>"#;
        let page = parse_page(html);
        assert_eq!(page.initial_summary[0].part, "2");
    }

    #[test]
    fn missing_or_broken_attributes_fall_back() {
        let html = r#"
            <span id="cumulative-gpa-display" data-initial-cgpa="abc"></span>
            <div id="session-summary"><ul data-initial-summary="not json"></ul></div>
        "#;
        assert_eq!(parse_page(html), PageSnapshot::default());
        assert_eq!(parse_page("<html></html>"), PageSnapshot::default());
    }
}
