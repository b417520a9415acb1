//! User account entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Plan tier enum
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    Free,
    Pro,
}

impl From<String> for PlanTier {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pro" => PlanTier::Pro,
            _ => PlanTier::Free,
        }
    }
}

impl From<PlanTier> for String {
    fn from(tier: PlanTier) -> Self {
        match tier {
            PlanTier::Free => "free".to_string(),
            PlanTier::Pro => "pro".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text", unique)]
    pub email: String,

    #[sea_orm(column_type = "Text")]
    pub plan: String,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Get the plan tier as an enum
    pub fn plan_tier(&self) -> PlanTier {
        PlanTier::from(self.plan.clone())
    }

    /// Whether this account is subject to the free-plan article cap
    pub fn is_free_plan(&self) -> bool {
        self.plan_tier() == PlanTier::Free
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::article::Entity")]
    Articles,
}

impl Related<super::article::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Articles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_tier_roundtrip() {
        assert_eq!(PlanTier::from(String::from(PlanTier::Pro)), PlanTier::Pro);
        assert_eq!(PlanTier::from(String::from(PlanTier::Free)), PlanTier::Free);
    }

    #[test]
    fn test_unknown_plan_defaults_to_free() {
        assert_eq!(PlanTier::from("enterprise".to_string()), PlanTier::Free);
    }
}
