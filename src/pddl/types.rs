use std::fmt;

/// A named object type with optional single inheritance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserType {
    name: String,
    father: Option<Box<UserType>>,
}

impl UserType {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), father: None }
    }

    pub fn with_father(name: &str, father: &UserType) -> Self {
        Self { name: name.to_string(), father: Some(Box::new(father.clone())) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn father(&self) -> Option<&UserType> {
        self.father.as_deref()
    }

    /// True when `self` is `other` or inherits from it.
    pub fn is_subtype_of(&self, other: &UserType) -> bool {
        let mut current = Some(self);
        while let Some(kind) = current {
            if kind.name == other.name {
                return true;
            }
            current = kind.father();
        }
        false
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Object {
    name: String,
    kind: UserType,
}

impl Object {
    pub fn new(name: &str, kind: &UserType) -> Self {
        Self { name: name.to_string(), kind: kind.clone() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &UserType {
        &self.kind
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
