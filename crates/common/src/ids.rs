use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(ProfileId, "Typed wrapper for profile UUIDs.");
define_id!(CompanyId, "Typed wrapper for company UUIDs.");
define_id!(
    ProfileCompanyEdgeId,
    "Typed wrapper for profile-company employment edge UUIDs."
);
define_id!(ScoringJobId, "Typed wrapper for scoring job UUIDs.");
define_id!(TemplateId, "Typed wrapper for prompt template UUIDs.");
define_id!(
    TemplateVersionId,
    "Typed wrapper for template version history row UUIDs."
);
