//! Slack message assembled from failed probes

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::probe::ProbeResult;

const TITLE: &str = "UptimeRobot SSL check";

/// One display block of a chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "SlackBlock")]
pub enum Block {
    /// Markdown section
    Header(String),
    Divider,
    /// Plain text section
    Text(String),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum SlackBlock {
    Section { text: SlackText },
    Divider,
}

#[derive(Serialize)]
#[serde(tag = "type", content = "text", rename_all = "snake_case")]
enum SlackText {
    Mrkdwn(String),
    PlainText(String),
}

impl From<Block> for SlackBlock {
    fn from(block: Block) -> Self {
        match block {
            Block::Header(text) => SlackBlock::Section {
                text: SlackText::Mrkdwn(text),
            },
            Block::Divider => SlackBlock::Divider,
            Block::Text(text) => SlackBlock::Section {
                text: SlackText::PlainText(text),
            },
        }
    }
}

/// Structured blocks plus a flat fallback for clients that cannot render them
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationMessage {
    pub text: String,
    pub blocks: Vec<Block>,
}

/// Build the report for the failed probes in `results`
///
/// Returns `None` when nothing failed. Failures keep the order of `results`.
pub fn format_failures(
    results: &[ProbeResult],
    generated_at: DateTime<Utc>,
    log_link: Option<&str>,
) -> Option<NotificationMessage> {
    let failures: Vec<&ProbeResult> = results.iter().filter(|r| r.is_failure()).collect();
    if failures.is_empty() {
        return None;
    }

    let mut blocks = vec![Block::Header(format!(
        "*{}* {}",
        TITLE,
        generated_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    ))];
    let mut lines = Vec::with_capacity(failures.len());

    for (index, failure) in failures.iter().enumerate() {
        let target = &failure.target;
        if index > 0 {
            blocks.push(Block::Divider);
        }
        blocks.push(Block::Header(format!(
            "*Failed to check HTTPS for {}*\n\nChecked {} port {} of {} and got error",
            target.display_name, target.host, target.port, target.monitor_url
        )));
        blocks.push(Block::Text(
            failure.error().map(ToString::to_string).unwrap_or_default(),
        ));
        lines.push(format!("Failed {}:{}", target.host, target.port));
    }

    if let Some(link) = log_link {
        blocks.push(Block::Header(format!("<{}|Open log for details>", link)));
    }

    Some(NotificationMessage {
        text: format!("{}: {}", TITLE, lines.join("\n")),
        blocks,
    })
}
