//! Conversion logic from domain read models to DTOs.

use belltower_shared::time::timestamp_to_rfc3339;

use crate::domain::{Connection, RoomRoster};
use crate::infrastructure::dto::http as dto;

/// Name shown for a member that has not recorded a display name
const UNNAMED_MEMBER: &str = "(unnamed)";

impl From<Connection> for dto::MemberDetailDto {
    fn from(model: Connection) -> Self {
        Self {
            connection_id: model.id.to_string(),
            display_name: model.display_name.map(|name| name.into_string()),
            connected_at: timestamp_to_rfc3339(model.connected_at.value()),
        }
    }
}

impl From<RoomRoster> for dto::RoomSummaryDto {
    fn from(model: RoomRoster) -> Self {
        Self {
            member_count: model.members.len(),
            members: model
                .members
                .into_iter()
                .map(|member| {
                    member
                        .display_name
                        .map(|name| name.into_string())
                        .unwrap_or_else(|| UNNAMED_MEMBER.to_string())
                })
                .collect(),
            id: model.id.into_string(),
            created_at: timestamp_to_rfc3339(model.created_at.value()),
        }
    }
}

impl From<RoomRoster> for dto::RoomDetailDto {
    fn from(model: RoomRoster) -> Self {
        Self {
            id: model.id.into_string(),
            members: model.members.into_iter().map(Into::into).collect(),
            created_at: timestamp_to_rfc3339(model.created_at.value()),
        }
    }
}
