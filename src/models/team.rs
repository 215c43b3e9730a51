//! Team and member models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A team member as listed inside its team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Member {
    #[serde(rename = "user_id")]
    pub id: String,
    pub username: String,
    /// Whether the member can be picked as a reviewer.
    pub is_active: bool,
}

/// A named team and its members in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    #[serde(rename = "team_name")]
    pub name: String,
    pub members: Vec<Member>,
}

/// A member together with the team it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    #[serde(rename = "user_id")]
    pub id: String,
    pub username: String,
    pub team_name: String,
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_wire_names() {
        let team: Team = serde_json::from_str(
            r#"{"team_name":"backend","members":[{"user_id":"u1","username":"Alice","is_active":true}]}"#,
        )
        .unwrap();
        assert_eq!(team.name, "backend");
        assert_eq!(team.members[0].id, "u1");

        let json = serde_json::to_string(&team).unwrap();
        assert!(json.contains("\"team_name\":\"backend\""));
        assert!(json.contains("\"user_id\":\"u1\""));
    }
}
