use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamStatus {
    #[default]
    Active,
    Inactive,
}

impl TeamStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TeamStatus::Active => "active",
            TeamStatus::Inactive => "inactive",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            TeamStatus::Active => TeamStatus::Inactive,
            TeamStatus::Inactive => TeamStatus::Active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub team_incharge_id: String,
    pub product_name: String,
    #[serde(default)]
    pub status: TeamStatus,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}
