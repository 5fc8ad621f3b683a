//! Domain types shared by the monitor, state, notification and rendering layers.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use cloudflare_client::Zone;
use serde::{Deserialize, Serialize};

/// Placeholder for missing account or plan names.
pub const MISSING_FIELD: &str = "-";

/// Number of trailing zone id characters kept in [`Resource::masked_id`].
const MASKED_ID_LEN: usize = 6;

/// A zone as presented to reports and notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Zone name (unique within one token's scope).
    pub name: String,
    pub account_name: String,
    pub plan_tier: String,
    /// `...` followed by the last six characters of the zone id.
    pub masked_id: String,
}

impl Resource {
    pub fn from_zone(zone: &Zone) -> Self {
        let account_name = zone
            .account
            .as_ref()
            .map(|a| a.name.clone())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| MISSING_FIELD.to_string());
        let plan_tier = zone
            .plan
            .as_ref()
            .map(|p| p.name.clone())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| MISSING_FIELD.to_string());

        let id_chars: Vec<char> = zone.id.chars().collect();
        let start = id_chars.len().saturating_sub(MASKED_ID_LEN);
        let masked_id = format!("...{}", id_chars[start..].iter().collect::<String>());

        Self {
            name: zone.name.clone(),
            account_name,
            plan_tier,
            masked_id,
        }
    }
}

/// Classified result of one Snippets status check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// 200 with `success: true`.
    Enabled,
    /// 200 with `success` false or absent.
    DisabledKnown,
    /// 403, the token lacks the Snippets read scope.
    PermissionDenied,
    /// 400, the zone is not entitled (plan or rollout).
    NotEntitled,
    /// 404, endpoint unavailable for this zone.
    NotFound,
    /// Any other status.
    OtherHttpError { message: String },
    /// The request never produced a response.
    TransportError,
}

impl ProbeOutcome {
    pub fn is_enabled(&self) -> bool {
        matches!(self, ProbeOutcome::Enabled)
    }

    /// Human readable status shown in reports.
    pub fn message(&self) -> &str {
        match self {
            ProbeOutcome::Enabled => "✅ 已开通",
            ProbeOutcome::DisabledKnown => "❓ 状态异常",
            ProbeOutcome::PermissionDenied => "🔒 权限不足 (请为 Token 添加 Snippets 读取权限)",
            ProbeOutcome::NotEntitled => "⏳ 未开通 (需升级套餐或等待灰度)",
            ProbeOutcome::NotFound => "🚫 接口不可用",
            ProbeOutcome::OtherHttpError { message } => message,
            ProbeOutcome::TransportError => "⚠️ 脚本执行失败",
        }
    }

    /// Short machine friendly name, used in logs and the JSON view.
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeOutcome::Enabled => "enabled",
            ProbeOutcome::DisabledKnown => "disabled_known",
            ProbeOutcome::PermissionDenied => "permission_denied",
            ProbeOutcome::NotEntitled => "not_entitled",
            ProbeOutcome::NotFound => "not_found",
            ProbeOutcome::OtherHttpError { .. } => "other_http_error",
            ProbeOutcome::TransportError => "transport_error",
        }
    }
}

/// A resource paired with its outcome for this run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeRecord {
    pub resource: Resource,
    pub outcome: ProbeOutcome,
}

/// Everything one execution produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunAggregate {
    /// Records in credential order, then listing order.
    pub records: Vec<ProbeRecord>,
    /// Credential-level and configuration diagnostics.
    pub diagnostics: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunAggregate {
    pub fn empty_with(diagnostic: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            records: Vec::new(),
            diagnostics: vec![diagnostic.into()],
            started_at: now,
            finished_at: now,
        }
    }

    pub fn enabled(&self) -> impl Iterator<Item = &ProbeRecord> {
        self.records.iter().filter(|r| r.outcome.is_enabled())
    }

    pub fn enabled_count(&self) -> usize {
        self.enabled().count()
    }

    /// Names of every zone probed as enabled in this run.
    pub fn enabled_names(&self) -> BTreeSet<String> {
        self.enabled().map(|r| r.resource.name.clone()).collect()
    }
}
