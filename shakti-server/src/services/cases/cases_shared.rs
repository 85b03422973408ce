use anyhow::Result;
use serde_json::Value;
use shakti_auth::{Principal, Role};
use shakti_core::{ServiceCapabilities, ServiceMethodKind, ShaktiApp, ShaktiError};

use crate::models::CustomerCase;
use crate::services::teams::teams_shared::team_ids_of;
use crate::services::{gate, ShaktiParams, ShaktiState};
use crate::store::{Query, Store};

pub const UPLOAD: &str = "upload";
pub const ASSIGN: &str = "assign";
pub const UNASSIGN: &str = "unassign";
pub const REASSIGN: &str = "reassign";
pub const STATS: &str = "stats";
pub const EXPORT: &str = "export";

pub fn capabilities() -> ServiceCapabilities {
    use ServiceMethodKind::*;
    ServiceCapabilities::from_methods(vec![Find, Get, Patch, Remove])
        .with_custom(&[UPLOAD, ASSIGN, UNASSIGN, REASSIGN, STATS, EXPORT])
}

pub fn register_hooks(app: &ShaktiApp<Value, ShaktiParams>, state: &ShaktiState) -> anyhow::Result<()> {
    use ServiceMethodKind::*;
    gate(
        app,
        state,
        "cases",
        &[
            (Find, Role::Telecaller),
            (Get, Role::Telecaller),
            (Patch, Role::Telecaller),
            (Custom(STATS), Role::Telecaller),
            (Remove, Role::TeamIncharge),
            (Custom(UPLOAD), Role::TeamIncharge),
            (Custom(ASSIGN), Role::TeamIncharge),
            (Custom(UNASSIGN), Role::TeamIncharge),
            (Custom(REASSIGN), Role::TeamIncharge),
            (Custom(EXPORT), Role::TeamIncharge),
        ],
    )
}

/// The slice of a tenant's cases a caller may touch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseScope {
    /// Admins and internal calls.
    Tenant,
    /// A team incharge: cases of the teams they lead.
    Teams(Vec<String>),
    /// A telecaller: cases assigned to them.
    Telecaller(String),
}

impl CaseScope {
    pub async fn of(store: &dyn Store, tenant_id: &str, principal: Option<&Principal>) -> Result<Self> {
        Ok(match principal {
            Some(p) if p.role == Role::Telecaller => CaseScope::Telecaller(p.id.clone()),
            Some(p) if p.role == Role::TeamIncharge => CaseScope::Teams(team_ids_of(store, tenant_id, &p.id).await?),
            _ => CaseScope::Tenant,
        })
    }

    pub fn apply(&self, query: Query) -> Query {
        match self {
            CaseScope::Tenant => query,
            CaseScope::Teams(ids) => query.is_in("team_id", ids.iter().cloned()),
            CaseScope::Telecaller(id) => query.eq("telecaller_id", id.as_str()),
        }
    }

    pub fn permits(&self, case: &CustomerCase) -> bool {
        match self {
            CaseScope::Tenant => true,
            CaseScope::Teams(ids) => case.team_id.as_ref().is_some_and(|t| ids.contains(t)),
            CaseScope::Telecaller(id) => case.telecaller_id.as_deref() == Some(id.as_str()),
        }
    }

    pub fn check(&self, case: &CustomerCase) -> Result<()> {
        if self.permits(case) {
            return Ok(());
        }
        let message = match self {
            CaseScope::Telecaller(_) => "You can only access your own cases",
            _ => "You can only access cases of your own teams",
        };
        Err(ShaktiError::forbidden(message).into_anyhow())
    }

    pub fn is_telecaller(&self) -> bool {
        matches!(self, CaseScope::Telecaller(_))
    }
}

/// Inclusive DPD bounds of a bucket such as `31-60` or `90+`.
/// `n+` means more than `n` days.
pub fn parse_dpd_range(raw: &str) -> Result<(i64, Option<i64>)> {
    let invalid = || ShaktiError::bad_request(format!("Invalid dpd_range `{raw}` (expected e.g. 0-30, 31-60, 61-90, 90+)")).into_anyhow();
    let raw = raw.trim();

    if let Some(min) = raw.strip_suffix('+') {
        let min: i64 = min.trim().parse().map_err(|_| invalid())?;
        let above = min
            .checked_add(1)
            .ok_or_else(|| ShaktiError::unprocessable(format!("dpd_range `{raw}` is out of range")).into_anyhow())?;
        return Ok((above, None));
    }
    let (lo, hi) = raw.split_once('-').ok_or_else(invalid)?;
    let lo: i64 = lo.trim().parse().map_err(|_| invalid())?;
    let hi: i64 = hi.trim().parse().map_err(|_| invalid())?;
    if lo > hi {
        return Err(invalid());
    }
    Ok((lo, Some(hi)))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn case(team: Option<&str>, telecaller: Option<&str>) -> CustomerCase {
        serde_json::from_value(json!({
            "id": "c1",
            "tenant_id": "t1",
            "team_id": team,
            "telecaller_id": telecaller,
            "status": "assigned",
        }))
        .unwrap()
    }

    #[test]
    fn dpd_buckets() {
        assert_eq!(parse_dpd_range("0-30").unwrap(), (0, Some(30)));
        assert_eq!(parse_dpd_range(" 61-90 ").unwrap(), (61, Some(90)));
        assert_eq!(parse_dpd_range("90+").unwrap(), (91, None));
        assert!(parse_dpd_range("60-31").is_err());
        assert!(parse_dpd_range("soon").is_err());

        let err = parse_dpd_range("9223372036854775807+").unwrap_err();
        assert_eq!(ShaktiError::from_anyhow(&err).unwrap().code(), 422);
    }

    #[test]
    fn scopes_limit_cases() {
        let telecaller = CaseScope::Telecaller("e1".into());
        assert!(telecaller.permits(&case(Some("team1"), Some("e1"))));
        assert!(telecaller.check(&case(Some("team1"), Some("e2"))).is_err());

        let incharge = CaseScope::Teams(vec!["team1".into()]);
        assert!(incharge.permits(&case(Some("team1"), None)));
        assert!(!incharge.permits(&case(Some("team2"), None)));
        assert!(!incharge.permits(&case(None, None)));

        assert!(CaseScope::Tenant.permits(&case(None, None)));
    }
}
