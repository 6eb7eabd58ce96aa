//! Method selection for one generation run.

use modmarshal_types::MethodSig;

/// The five method roles a generated type can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Append,
    Marshal,
    Write,
    Unmarshal,
    Read,
}

pub(crate) const ROLES: [Role; 5] = [
    Role::Append,
    Role::Marshal,
    Role::Write,
    Role::Unmarshal,
    Role::Read,
];

/// Which methods to emit and under which names. A `None` disables that
/// role for the whole run.
#[derive(Debug, Clone)]
pub struct GenOptions {
    pub append: Option<String>,
    pub marshal: Option<String>,
    pub write: Option<String>,
    pub unmarshal: Option<String>,
    pub read: Option<String>,
}

impl Default for GenOptions {
    fn default() -> Self {
        Self {
            append: Some("AppendBinary".to_string()),
            marshal: Some("MarshalBinary".to_string()),
            write: Some("WriteTo".to_string()),
            unmarshal: Some("UnmarshalBinary".to_string()),
            read: Some("ReadFrom".to_string()),
        }
    }
}

impl GenOptions {
    pub fn method_name(&self, role: Role) -> Option<&str> {
        match role {
            Role::Append => self.append.as_deref(),
            Role::Marshal => self.marshal.as_deref(),
            Role::Write => self.write.as_deref(),
            Role::Unmarshal => self.unmarshal.as_deref(),
            Role::Read => self.read.as_deref(),
        }
    }

    pub fn encode_requested(&self) -> bool {
        self.append.is_some() || self.marshal.is_some() || self.write.is_some()
    }

    pub fn decode_requested(&self) -> bool {
        self.unmarshal.is_some() || self.read.is_some()
    }

    /// The method signature a pre-existing implementation of `role` must
    /// carry to be recognized as already present.
    pub fn capability_sig(&self, role: Role) -> Option<MethodSig> {
        let name = self.method_name(role)?;

        Some(match role {
            Role::Append => MethodSig::new(name, &["[]byte"], &["[]byte", "error"]),
            Role::Marshal => MethodSig::new(name, &[], &["[]byte", "error"]),
            Role::Write => MethodSig::new(name, &["io.Writer"], &["int64", "error"]),
            Role::Unmarshal => MethodSig::new(name, &["[]byte"], &["error"]),
            Role::Read => MethodSig::new(name, &["io.Reader"], &["int64", "error"]),
        })
    }
}
