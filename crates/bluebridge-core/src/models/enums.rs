use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    User = 1,
    Admin = 2,
    WellOwner = 3,
}

#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    #[default]
    Android = 1,
    Ios = 2,
    Web = 3,
}

#[derive(Debug)]
pub struct EnumParseError {
    enum_name: &'static str,
    value: String,
}

impl EnumParseError {
    fn new(enum_name: &'static str, value: impl Into<String>) -> Self {
        Self {
            enum_name,
            value: value.into(),
        }
    }
}

impl std::fmt::Display for EnumParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {} value: {}", self.enum_name, self.value)
    }
}

impl std::error::Error for EnumParseError {}

impl UserRole {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
            Self::WellOwner => "well_owner",
        }
    }

    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }
}

impl std::str::FromStr for UserRole {
    type Err = EnumParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            "well_owner" => Ok(Self::WellOwner),
            _ => Err(EnumParseError::new("user_role", value)),
        }
    }
}

impl TryFrom<i32> for UserRole {
    type Error = EnumParseError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::User),
            2 => Ok(Self::Admin),
            3 => Ok(Self::WellOwner),
            _ => Err(EnumParseError::new("user_role", value.to_string())),
        }
    }
}

impl DeviceType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Android => "android",
            Self::Ios => "ios",
            Self::Web => "web",
        }
    }

    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }
}

impl std::str::FromStr for DeviceType {
    type Err = EnumParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "android" => Ok(Self::Android),
            "ios" => Ok(Self::Ios),
            "web" => Ok(Self::Web),
            _ => Err(EnumParseError::new("device_type", value)),
        }
    }
}

impl TryFrom<i32> for DeviceType {
    type Error = EnumParseError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Android),
            2 => Ok(Self::Ios),
            3 => Ok(Self::Web),
            _ => Err(EnumParseError::new("device_type", value.to_string())),
        }
    }
}
