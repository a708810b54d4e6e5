use crate::domain::model::{ActivityRecord, AgentCount};

pub const DEFAULT_MARKER_RADIUS: f64 = 10.0;
pub const DEFAULT_CLUSTER_WEIGHT: u32 = 1;

impl AgentCount {
    /// Looks up the bucket after trimming, collapsing inner whitespace and
    /// case-folding. Anything that is not one of the known spellings,
    /// including empty or missing text, is `Unrecognized`.
    pub fn from_category(category: Option<&str>) -> Self {
        let Some(category) = category else {
            return AgentCount::Unrecognized;
        };

        let normalized = category
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        match normalized.as_str() {
            "1 or 2" => AgentCount::OneOrTwo,
            "between 3 and 5" | "3 to 5" => AgentCount::ThreeToFive,
            "between 6 and 10" | "6 to 10" => AgentCount::SixToTen,
            "more than 10" => AgentCount::MoreThanTen,
            _ => AgentCount::Unrecognized,
        }
    }

    pub fn marker_radius(self) -> f64 {
        match self {
            AgentCount::OneOrTwo => 8.0,
            AgentCount::ThreeToFive => 12.0,
            AgentCount::SixToTen => 16.0,
            AgentCount::MoreThanTen => 20.0,
            AgentCount::Unrecognized => DEFAULT_MARKER_RADIUS,
        }
    }

    pub fn cluster_weight(self) -> u32 {
        match self {
            AgentCount::OneOrTwo => 1,
            AgentCount::ThreeToFive => 4,
            AgentCount::SixToTen => 8,
            AgentCount::MoreThanTen => 15,
            AgentCount::Unrecognized => DEFAULT_CLUSTER_WEIGHT,
        }
    }
}

pub fn marker_radius(category: Option<&str>) -> f64 {
    AgentCount::from_category(category).marker_radius()
}

pub fn cluster_weight(category: Option<&str>) -> u32 {
    AgentCount::from_category(category).cluster_weight()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerStyle {
    pub agent_count: AgentCount,
    pub radius: f64,
    pub weight: u32,
}

pub fn marker_style(category: Option<&str>) -> MarkerStyle {
    let agent_count = AgentCount::from_category(category);
    MarkerStyle {
        agent_count,
        radius: agent_count.marker_radius(),
        weight: agent_count.cluster_weight(),
    }
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Labelled popup rows. Values are kept raw here and escaped only in
/// [`PopupContent::to_html`].
#[derive(Debug, Clone, PartialEq)]
pub struct PopupContent<'a> {
    rows: [(&'static str, &'a str); 6],
}

impl<'a> PopupContent<'a> {
    pub fn from_record(record: &'a ActivityRecord) -> Self {
        Self {
            rows: [
                ("Location", record.location.as_str()),
                ("Borough", record.borough.as_str()),
                ("Date", record.date_text.as_str()),
                ("Time", record.time_of_day.as_str()),
                ("Agents", record.agent_count_text.as_str()),
                ("Description", record.description.as_str()),
            ],
        }
    }

    pub fn to_html(&self) -> String {
        self.rows
            .iter()
            .map(|(label, value)| format!("<strong>{}:</strong> {}", label, escape_html(value)))
            .collect::<Vec<_>>()
            .join("<br>")
    }
}
