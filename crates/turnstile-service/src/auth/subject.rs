//! Subject types for authorization.
//!
//! A subject is a principal, a group membership, or one of the pseudo-principals.
//! An identity expands to every subject whose grants apply to it.

use uuid::Uuid;

use super::identity::Identity;

/// A subject for authorization checks.
///
/// In Casbin terms, this is the `sub` parameter in enforcement requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Subject {
    /// An identity by id.
    Principal(Uuid),
    /// A group membership contributed by the extension hook.
    Group(String),
    /// The public visitor only.
    Anonymous,
    /// Any authenticated identity.
    Authenticated,
    /// Everyone.
    All,
}

impl Subject {
    /// Returns the Casbin subject string.
    #[must_use]
    pub fn casbin_subject(&self) -> String {
        match self {
            Self::Principal(id) => format!("principal:{id}"),
            Self::Group(name) => format!("group:{name}"),
            Self::Anonymous => "anonymous".to_string(),
            Self::Authenticated => "authenticated".to_string(),
            Self::All => "all".to_string(),
        }
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.casbin_subject())
    }
}

/// An expanded set of subjects for authorization.
///
/// An authenticated identity expands to its principal, its memberships,
/// `authenticated` and `all`. The visitor expands to `anonymous` and `all`.
/// The startup identity expands to nothing and so is denied everywhere.
///
/// Access is granted if ANY of these subjects has the required permission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedSubjects {
    subjects: Vec<Subject>,
}

impl ExpandedSubjects {
    #[must_use]
    pub fn for_identity(identity: &Identity) -> Self {
        if identity.is_startup() {
            return Self {
                subjects: Vec::new(),
            };
        }

        if identity.is_anonymous() {
            let mut subjects = vec![Subject::Anonymous];
            subjects.extend(
                identity
                    .memberships()
                    .iter()
                    .map(|group| Subject::Group(group.clone())),
            );
            subjects.push(Subject::All);
            return Self { subjects };
        }

        let mut subjects = vec![Subject::Principal(identity.id())];
        subjects.extend(
            identity
                .memberships()
                .iter()
                .map(|group| Subject::Group(group.clone())),
        );
        if identity.is_authenticated() {
            subjects.push(Subject::Authenticated);
        }
        subjects.push(Subject::All);

        Self { subjects }
    }

    /// Returns `true` if this set contains the given subject.
    #[must_use]
    pub fn contains(&self, subject: &Subject) -> bool {
        self.subjects.contains(subject)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

impl<'a> IntoIterator for &'a ExpandedSubjects {
    type Item = &'a Subject;
    type IntoIter = std::slice::Iter<'a, Subject>;

    fn into_iter(self) -> Self::IntoIter {
        self.subjects.iter()
    }
}
