//! Notification message formatting.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::domain::Resource;

/// Telegram's per-message text limit.
pub const MESSAGE_CHAR_LIMIT: usize = 4096;

/// Room kept for the "not listed" notes of both lists.
const OVERFLOW_NOTE_RESERVE: usize = 64;

/// A formatted message ready to hand to a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    /// Title line, without markup.
    pub title: String,
    /// Full Markdown text as delivered.
    pub text: String,
    /// Zones reported as newly enabled.
    pub newly_enabled: Vec<String>,
    /// Every zone enabled in the run that produced this message.
    pub current_enabled: Vec<String>,
}

impl NotificationMessage {
    /// Message used by channel self-tests.
    pub fn test_message() -> Self {
        let title = "Snippets 监控通知测试".to_string();
        Self {
            text: format!("🔔 *{title}*\n\n通知渠道配置正常。"),
            title,
            newly_enabled: Vec::new(),
            current_enabled: Vec::new(),
        }
    }

    /// Build the "newly enabled" announcement, sized for one Telegram message.
    pub fn newly_enabled(
        newly: &[&Resource],
        current: &BTreeSet<String>,
        now: DateTime<Utc>,
        tz: Tz,
    ) -> Self {
        Self::newly_enabled_within(newly, current, now, tz, MESSAGE_CHAR_LIMIT)
    }

    /// Build the announcement so its text stays within `limit` characters.
    ///
    /// Zones are dropped whole, never cut mid-entity: newly enabled zones
    /// take priority over the current list, and each list that does not fit
    /// ends with a count of what was left out.
    pub fn newly_enabled_within(
        newly: &[&Resource],
        current: &BTreeSet<String>,
        now: DateTime<Utc>,
        tz: Tz,
        limit: usize,
    ) -> Self {
        let title = "Snippet 功能已开通检测通知".to_string();
        let header = format!("🎉 *{title}* 🎉\n\n发现以下域名新获得 Snippets 权限：\n");
        let current_head = format!("\n📋 当前已开通 ({}): ", current.len());
        let footer = format!(
            "\n\n📅 时间: {}",
            now.with_timezone(&tz).format("%Y/%m/%d %H:%M:%S")
        );

        let fixed = char_len(&header) + char_len(&current_head) + char_len(&footer) + OVERFLOW_NOTE_RESERVE;
        let mut remaining = limit.saturating_sub(fixed);
        let mut text = header;

        let mut listed = 0;
        for resource in newly {
            let entry = zone_entry(resource);
            let len = char_len(&entry);
            if len > remaining {
                break;
            }
            remaining -= len;
            text.push_str(&entry);
            listed += 1;
        }
        if listed < newly.len() {
            text.push_str(&format!("\n➕ 另有 {} 个新开通域名未列出\n", newly.len() - listed));
        }

        text.push_str(&current_head);
        let mut shown = 0;
        for name in current {
            let piece = if shown == 0 {
                escape_markdown(name)
            } else {
                format!(", {}", escape_markdown(name))
            };
            let len = char_len(&piece);
            if len > remaining {
                break;
            }
            remaining -= len;
            text.push_str(&piece);
            shown += 1;
        }
        if shown < current.len() {
            text.push_str(&format!(" 等另外 {} 个", current.len() - shown));
        }
        text.push_str(&footer);

        Self {
            title,
            text,
            newly_enabled: newly.iter().map(|r| r.name.clone()).collect(),
            current_enabled: current.iter().cloned().collect(),
        }
    }
}

/// One zone block. The name sits inside bold, where legacy Markdown takes
/// everything up to the next `*` literally, so only `*` is removed.
fn zone_entry(resource: &Resource) -> String {
    format!(
        "\n🌍 *{}* \n👤 账号: `{}`\n",
        resource.name.replace('*', ""),
        resource.account_name.replace('`', "'"),
    )
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Escape characters that legacy Telegram Markdown treats as markup.
pub fn escape_markdown(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
