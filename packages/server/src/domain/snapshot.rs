//! Participant snapshot for the bootstrap message.
//!
//! Pure functions: persisted membership in, annotated participants out.

use std::collections::HashSet;

use super::{
    entity::{Membership, Participant},
    permission::Role,
    value_object::UserId,
};

/// Merge persisted membership with the set of users currently online.
///
/// # Arguments
///
/// * `memberships` - Every persisted member of the room
/// * `owner_id` - Owner of the room; that member becomes the host
/// * `online_user_ids` - Users with at least one live connection in the room
///
/// # Returns
///
/// Host first, then members ordered by username.
pub fn build_participant_snapshot(
    memberships: Vec<Membership>,
    owner_id: &UserId,
    online_user_ids: &[UserId],
) -> Vec<Participant> {
    let online: HashSet<&UserId> = online_user_ids.iter().collect();

    let mut participants: Vec<Participant> = memberships
        .into_iter()
        .map(|membership| {
            let role = Role::of(owner_id, &membership.user.id);
            Participant {
                is_online: online.contains(&membership.user.id),
                has_control_permission: role == Role::Host || membership.has_control_permission,
                role,
                user: membership.user,
            }
        })
        .collect();

    participants.sort_by(|a, b| {
        (a.role != Role::Host)
            .cmp(&(b.role != Role::Host))
            .then_with(|| a.user.username.cmp(&b.user.username))
    });

    participants
}
