use enumset::EnumSetType;

/// Language features a problem uses. `Problem::kind` collects them and
/// engines advertise which ones they can handle.
#[derive(EnumSetType, Debug)]
pub enum Requirement {
    Strips,
    Typing,
    NegativePreconditions,
    ConditionalEffects,
    UniversalEffects,
    ActionCosts,
}

impl Requirement {
    /// Matching PDDL `:requirements` flag.
    pub fn pddl_keyword(&self) -> &'static str {
        match self {
            Requirement::Strips => ":strips",
            Requirement::Typing => ":typing",
            Requirement::NegativePreconditions => ":negative-preconditions",
            Requirement::ConditionalEffects => ":conditional-effects",
            Requirement::UniversalEffects => ":conditional-effects",
            Requirement::ActionCosts => ":action-costs",
        }
    }
}
