//! Role-based zone gating.
//!
//! Every navigation into a zone is evaluated once against the role held in
//! the authenticated session's server-side profile record. Roles form a
//! closed set and map to zones through [`Role::allowed_zones`]; nothing read
//! from client-local storage takes part in the decision.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Path of the sign-in screen.
pub const LOGIN_PATH: &str = "/login";

/// Validation errors raised while reading a profile record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileValidationError {
    /// The user id was not a UUID.
    InvalidUserId,
    /// The role column held a value outside the known role set.
    UnknownRole {
        /// The rejected input.
        value: String,
    },
}

impl fmt::Display for ProfileValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUserId => write!(f, "profile user id must be a valid UUID"),
            Self::UnknownRole { value } => write!(f, "unknown role: {value}"),
        }
    }
}

impl std::error::Error for ProfileValidationError {}

/// Logical section of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    /// Academy administration: billing, staff invitations, settings.
    Command,
    /// Coaching tools: schedules, rosters, attendance.
    Staff,
    /// Athlete dashboard.
    Athlete,
    /// Parent dashboard for linked athletes.
    Family,
}

impl Zone {
    /// Landing path of the zone.
    pub fn home_path(self) -> &'static str {
        match self {
            Self::Command => "/command",
            Self::Staff => "/staff",
            Self::Athlete => "/athlete",
            Self::Family => "/family",
        }
    }
}

/// Academy membership role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Academy owner.
    Owner,
    /// Administrator acting for the owner.
    Admin,
    /// Coach running sessions.
    Coach,
    /// Front-desk or support staff.
    Staff,
    /// Enrolled athlete.
    Athlete,
    /// Parent or guardian of an athlete.
    Parent,
}

impl Role {
    /// Zones this role may enter; the first entry is the role's home zone.
    pub fn allowed_zones(self) -> &'static [Zone] {
        match self {
            Self::Owner | Self::Admin => &[Zone::Command, Zone::Staff],
            Self::Coach | Self::Staff => &[Zone::Staff],
            Self::Athlete => &[Zone::Athlete],
            Self::Parent => &[Zone::Family],
        }
    }

    /// Zone a user lands in after sign-in or a refused navigation.
    pub fn home_zone(self) -> Zone {
        match self {
            Self::Owner | Self::Admin => Zone::Command,
            Self::Coach | Self::Staff => Zone::Staff,
            Self::Athlete => Zone::Athlete,
            Self::Parent => Zone::Family,
        }
    }

    /// Whether this role may enter `zone`.
    pub fn may_enter(self, zone: Zone) -> bool {
        self.allowed_zones().contains(&zone)
    }
}

impl FromStr for Role {
    type Err = ProfileValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalised.as_str() {
            "owner" | "academy_owner" => Ok(Self::Owner),
            "admin" | "administrator" => Ok(Self::Admin),
            "coach" | "head_coach" | "assistant_coach" => Ok(Self::Coach),
            "staff" => Ok(Self::Staff),
            "athlete" | "student" => Ok(Self::Athlete),
            "parent" | "guardian" => Ok(Self::Parent),
            _ => Err(ProfileValidationError::UnknownRole {
                value: s.to_owned(),
            }),
        }
    }
}

/// Identity and role taken from the signed-in user's profile row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedProfile {
    user_id: Uuid,
    role: Role,
}

impl AuthenticatedProfile {
    /// Build a profile from an already typed role.
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Build a profile from the raw profile record columns.
    ///
    /// # Examples
    /// ```
    /// use wild_robot::domain::{AuthenticatedProfile, Role};
    ///
    /// let profile = AuthenticatedProfile::from_record(
    ///     "123e4567-e89b-12d3-a456-426614174000",
    ///     "Head Coach",
    /// )
    /// .expect("valid record");
    /// assert_eq!(profile.role(), Role::Coach);
    /// ```
    pub fn from_record(user_id: &str, role: &str) -> Result<Self, ProfileValidationError> {
        let user_id =
            Uuid::parse_str(user_id.trim()).map_err(|_| ProfileValidationError::InvalidUserId)?;
        Ok(Self::new(user_id, role.parse()?))
    }

    /// Authenticated user id.
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// Role held by the user.
    pub fn role(&self) -> Role {
        self.role
    }
}

/// Outcome of a navigation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// Render the requested zone.
    Allow,
    /// No authenticated profile; go to sign-in.
    RedirectToLogin,
    /// Authenticated but not permitted; go to the role's home zone.
    RedirectToZone(Zone),
}

impl AccessDecision {
    /// Path to navigate to, or `None` when access is allowed.
    pub fn redirect_path(self) -> Option<&'static str> {
        match self {
            Self::Allow => None,
            Self::RedirectToLogin => Some(LOGIN_PATH),
            Self::RedirectToZone(zone) => Some(zone.home_path()),
        }
    }
}

/// Decide whether `profile` may enter `zone`.
///
/// # Examples
/// ```
/// use wild_robot::domain::{AccessDecision, AuthenticatedProfile, Role, Zone, evaluate_access};
/// use uuid::Uuid;
///
/// let parent = AuthenticatedProfile::new(Uuid::new_v4(), Role::Parent);
/// assert_eq!(
///     evaluate_access(Some(&parent), Zone::Command),
///     AccessDecision::RedirectToZone(Zone::Family)
/// );
/// assert_eq!(evaluate_access(None, Zone::Staff), AccessDecision::RedirectToLogin);
/// ```
pub fn evaluate_access(profile: Option<&AuthenticatedProfile>, zone: Zone) -> AccessDecision {
    match profile {
        None => AccessDecision::RedirectToLogin,
        Some(profile) if profile.role().may_enter(zone) => AccessDecision::Allow,
        Some(profile) => AccessDecision::RedirectToZone(profile.role().home_zone()),
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    const ALL_ROLES: [Role; 6] = [
        Role::Owner,
        Role::Admin,
        Role::Coach,
        Role::Staff,
        Role::Athlete,
        Role::Parent,
    ];

    fn profile(role: Role) -> AuthenticatedProfile {
        AuthenticatedProfile::new(Uuid::new_v4(), role)
    }

    #[rstest]
    fn every_role_may_enter_its_home_zone() {
        for role in ALL_ROLES {
            assert!(role.may_enter(role.home_zone()), "{role:?}");
            assert_eq!(role.allowed_zones().first(), Some(&role.home_zone()));
        }
    }

    #[rstest]
    #[case(Role::Owner, Zone::Command, AccessDecision::Allow)]
    #[case(Role::Owner, Zone::Staff, AccessDecision::Allow)]
    #[case(Role::Coach, Zone::Staff, AccessDecision::Allow)]
    #[case(Role::Coach, Zone::Command, AccessDecision::RedirectToZone(Zone::Staff))]
    #[case(Role::Athlete, Zone::Staff, AccessDecision::RedirectToZone(Zone::Athlete))]
    #[case(Role::Parent, Zone::Athlete, AccessDecision::RedirectToZone(Zone::Family))]
    #[case(Role::Staff, Zone::Family, AccessDecision::RedirectToZone(Zone::Staff))]
    fn decisions_follow_role_table(
        #[case] role: Role,
        #[case] zone: Zone,
        #[case] expected: AccessDecision,
    ) {
        assert_eq!(evaluate_access(Some(&profile(role)), zone), expected);
    }

    #[rstest]
    #[case(Zone::Command)]
    #[case(Zone::Athlete)]
    fn missing_session_redirects_to_login(#[case] zone: Zone) {
        let decision = evaluate_access(None, zone);
        assert_eq!(decision, AccessDecision::RedirectToLogin);
        assert_eq!(decision.redirect_path(), Some(LOGIN_PATH));
    }

    #[rstest]
    #[case("owner", Role::Owner)]
    #[case("  ADMIN ", Role::Admin)]
    #[case("assistant-coach", Role::Coach)]
    #[case("Guardian", Role::Parent)]
    #[case("student", Role::Athlete)]
    fn roles_parse_from_profile_strings(#[case] raw: &str, #[case] expected: Role) {
        assert_eq!(raw.parse::<Role>(), Ok(expected));
    }

    #[rstest]
    #[case("superuser")]
    #[case("")]
    fn unknown_roles_are_rejected(#[case] raw: &str) {
        assert!(matches!(
            raw.parse::<Role>(),
            Err(ProfileValidationError::UnknownRole { .. })
        ));
    }

    #[rstest]
    fn profile_records_need_uuid_ids() {
        assert_eq!(
            AuthenticatedProfile::from_record("admin", "owner"),
            Err(ProfileValidationError::InvalidUserId)
        );
    }

    #[rstest]
    fn redirect_paths_point_at_zone_homes() {
        assert_eq!(AccessDecision::Allow.redirect_path(), None);
        assert_eq!(
            AccessDecision::RedirectToZone(Zone::Family).redirect_path(),
            Some("/family")
        );
    }
}
