use std::sync::LazyLock;

use regex::Regex;

static INVITATION_EXPIRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Invitation expiring in (.+)").unwrap());
static TRIAL_END_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Ends in (.+)").unwrap());

/// Literal English status → canonical Japanese phrase.
const STATUS_TABLE: &[(&str, &str)] = &[
    ("Creator declined", "クリエイターが拒否済み"),
    ("Invitation expired", "招待が期限切れ"),
    ("Reviewer declined", "審査員により却下"),
    (
        "Reviewer declinedThe account may be affiliated with other accounts",
        "審査員により却下このアカウントは他のアカウントと提携している可能性があります",
    ),
    ("Reviewer declinedInvalid LIVE", "審査員により却下無効なLIVE"),
    ("Trial incomplete", "トライアル未完了"),
    (
        "Trial incompleteLIVE duration less than 10m",
        "トライアル未完了LIVE時間が10分未満",
    ),
    ("Review period expired", "審査期間終了"),
    ("Managed by Creator Network", "エージェンシーによって管理中"),
    ("Terminated", "関係終了"),
    ("Pending", "保留中"),
    ("Active", "アクティブ"),
    ("Inactive", "非アクティブ"),
    ("Declined", "クリエイターが拒否済み"),
    ("Expired", "招待が期限切れ"),
    ("Review expired", "審査期間終了"),
    ("Managed by agency", "エージェンシーによって管理中"),
    ("Trial ongoing", "トライアル進行中"),
    ("Awaiting approval", "承認待ち"),
];

/// Exact-match lookup in the status table.
pub fn lookup(status: &str) -> Option<&'static str> {
    STATUS_TABLE
        .iter()
        .find(|(from, _)| *from == status)
        .map(|(_, to)| *to)
}

/// A status made of a state name glued to trailing time information, e.g.
/// `"Trial ongoingEnds in 2 days"`.
pub struct CompositeStatus {
    state: &'static str,
    marker: &'static str,
    suffix_re: &'static LazyLock<Regex>,
    canonical: &'static str,
    detail: &'static str,
}

pub static AWAITING_APPROVAL: CompositeStatus = CompositeStatus {
    state: "Awaiting approval",
    marker: "Invitation expiring in",
    suffix_re: &INVITATION_EXPIRY_RE,
    canonical: "承認待ち",
    detail: "招待期限",
};

pub static TRIAL_ONGOING: CompositeStatus = CompositeStatus {
    state: "Trial ongoing",
    marker: "Ends in",
    suffix_re: &TRIAL_END_RE,
    canonical: "トライアル進行中",
    detail: "終了予定",
};

/// Checked in order, before the literal table.
static COMPOSITES: [&CompositeStatus; 2] = [&AWAITING_APPROVAL, &TRIAL_ONGOING];

impl CompositeStatus {
    pub fn matches(&self, status: &str) -> bool {
        status.contains(self.state) && status.contains(self.marker)
    }

    /// Time information after the marker, if any.
    pub fn suffix<'s>(&self, status: &'s str) -> Option<&'s str> {
        self.suffix_re
            .captures(status)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty())
    }

    /// Canonical phrase with the suffix interpolated, or the bare phrase.
    pub fn render(&self, status: &str) -> String {
        match self.suffix(status) {
            Some(s) => format!("{}（{}: {}）", self.canonical, self.detail, s),
            None => self.canonical.to_string(),
        }
    }
}

/// Canonical form of `status`, or `None` when nothing recognizes it.
pub fn canonical_status(status: &str) -> Option<String> {
    if let Some(rule) = COMPOSITES.iter().find(|r| r.matches(status)) {
        return Some(rule.render(status));
    }
    lookup(status).map(str::to_string)
}
