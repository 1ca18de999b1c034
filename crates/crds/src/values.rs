//! String-valued enumerations used in resource parameters
//!
//! GitLab exchanges these as lowercase strings; the CRD schema restricts them
//! to the known set and the controller converts with `as_str` / `FromStr`.

use crate::error::CrdError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident => $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $value)]
                $variant,
            )+
        }

        impl $name {
            /// Wire form of the value
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $value,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = CrdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($value => Ok(Self::$variant),)+
                    other => Err(CrdError::UnknownValue {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

string_enum! {
    /// Project or group visibility
    VisibilityValue {
        /// Visible to members only
        Private => "private",
        /// Visible to any signed-in user
        Internal => "internal",
        /// Visible to everyone
        Public => "public",
    }
}

string_enum! {
    /// Feature access level of a project (issues, wiki, builds, ...)
    AccessControlValue {
        /// Feature turned off
        Disabled => "disabled",
        /// Members only
        Private => "private",
        /// Everyone with access to the project
        Enabled => "enabled",
        /// Everyone, including anonymous users
        Public => "public",
    }
}

string_enum! {
    /// Merge method for merge requests
    MergeMethodValue {
        /// Merge commit
        Merge => "merge",
        /// Merge commit with semi-linear history
        RebaseMerge => "rebase_merge",
        /// Fast-forward only
        FastForward => "ff",
    }
}

string_enum! {
    /// Squash option for merge requests
    SquashOptionValue {
        /// Never squash
        Never => "never",
        /// Always squash
        Always => "always",
        /// Squash by default, user may opt out
        DefaultOn => "default_on",
        /// Do not squash by default, user may opt in
        DefaultOff => "default_off",
    }
}

string_enum! {
    /// CI/CD variable type
    VariableTypeValue {
        /// Environment variable
        EnvVar => "env_var",
        /// Written to a file, the variable holds the path
        File => "file",
    }
}

string_enum! {
    /// Scope of a runner
    RunnerTypeValue {
        /// Available to every project
        Instance => "instance_type",
        /// Available to one group and its projects
        Group => "group_type",
        /// Available to one project
        Project => "project_type",
    }
}

string_enum! {
    /// Which refs a runner accepts jobs from
    RunnerAccessLevelValue {
        /// Any ref
        NotProtected => "not_protected",
        /// Protected refs only
        RefProtected => "ref_protected",
    }
}

string_enum! {
    /// Who may create projects in a group
    ProjectCreationLevelValue {
        /// Nobody
        NoOne => "noone",
        /// Maintainers
        Maintainer => "maintainer",
        /// Developers and maintainers
        Developer => "developer",
    }
}

string_enum! {
    /// Who may create subgroups in a group
    SubgroupCreationLevelValue {
        /// Owners
        Owner => "owner",
        /// Maintainers and owners
        Maintainer => "maintainer",
    }
}
