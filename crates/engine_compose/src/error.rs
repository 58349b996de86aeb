//! Composition errors.
//!
//! Every variant is fatal for the kind it names: the kind is never handed to
//! the runtime, and the registry refuses to build.

use engine_component::{Contract, FieldType, Hook, LAccess};

/// Errors raised while resolving kinds and building the registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompositionError {
    /// A kind was declared with no fragments.
    #[error("kind `{kind}` has no fragments")]
    EmptyKind {
        /// Kind name.
        kind: String,
    },

    /// The same fragment appears twice in one kind's fragment list.
    #[error("kind `{kind}` lists fragment `{fragment}` more than once")]
    RepeatedFragment {
        /// Kind name.
        kind: String,
        /// Fragment name.
        fragment: &'static str,
    },

    /// Two fragments declare a field with the same name and different types.
    #[error("kind `{kind}`: field `{field}` is `{first}` in `{first_fragment}` but `{second}` in `{second_fragment}`")]
    FieldTypeConflict {
        /// Kind name.
        kind: String,
        /// Field name.
        field: &'static str,
        /// Type of the first declaration.
        first: FieldType,
        /// Fragment of the first declaration.
        first_fragment: &'static str,
        /// Type of the conflicting declaration.
        second: FieldType,
        /// Fragment of the conflicting declaration.
        second_fragment: &'static str,
    },

    /// Two fragments declare the same field and it is not shared by both.
    #[error("kind `{kind}`: field `{field}` declared by both `{first_fragment}` and `{second_fragment}` without being shared")]
    DuplicateField {
        /// Kind name.
        kind: String,
        /// Field name.
        field: &'static str,
        /// Fragment of the first declaration.
        first_fragment: &'static str,
        /// Fragment of the duplicate declaration.
        second_fragment: &'static str,
    },

    /// A fragment imports a field no fragment of the kind declares.
    #[error("kind `{kind}`: fragment `{fragment}` imports missing field `{field}`")]
    MissingImport {
        /// Kind name.
        kind: String,
        /// Importing fragment.
        fragment: &'static str,
        /// Imported field.
        field: &'static str,
    },

    /// A fragment imports a field with a type other than the declared one.
    #[error("kind `{kind}`: fragment `{fragment}` imports `{field}` as `{expected}` but it is `{found}`")]
    ImportTypeMismatch {
        /// Kind name.
        kind: String,
        /// Importing fragment.
        fragment: &'static str,
        /// Imported field.
        field: &'static str,
        /// Type the import expects.
        expected: FieldType,
        /// Declared type.
        found: FieldType,
    },

    /// A hook implementation carries a body of the wrong shape for its hook.
    #[error("kind `{kind}`: fragment `{fragment}` implements `{hook}` with a mismatched body")]
    HookBodyMismatch {
        /// Kind name.
        kind: String,
        /// Fragment name.
        fragment: &'static str,
        /// Hook name.
        hook: Hook,
    },

    /// More than one terminal implementation of a hook.
    #[error("kind `{kind}`: hook `{hook}` is terminal in both `{first}` and `{second}`")]
    DuplicateTerminal {
        /// Kind name.
        kind: String,
        /// Hook name.
        hook: Hook,
        /// First terminal fragment.
        first: &'static str,
        /// Second terminal fragment.
        second: &'static str,
    },

    /// No fragment provides a sole-provider contract.
    #[error("kind `{kind}`: no fragment provides `{contract}`")]
    MissingProvider {
        /// Kind name.
        kind: String,
        /// The unprovided contract.
        contract: Contract,
    },

    /// More than one fragment provides a sole-provider contract.
    #[error("kind `{kind}`: `{contract}` provided by both `{first}` and `{second}`")]
    DuplicateProvider {
        /// Kind name.
        kind: String,
        /// The contract.
        contract: Contract,
        /// First provider.
        first: &'static str,
        /// Second provider.
        second: &'static str,
    },

    /// Two fragments contribute a method with the same name.
    #[error("kind `{kind}`: method `{method}` provided by both `{first}` and `{second}`")]
    DuplicateMethod {
        /// Kind name.
        kind: String,
        /// Method name.
        method: &'static str,
        /// First provider.
        first: &'static str,
        /// Second provider.
        second: &'static str,
    },

    /// Two handlers for one sense operation.
    #[error("kind `{kind}`: sense `{access}` handled by both `{first}` and `{second}`")]
    DuplicateSense {
        /// Kind name.
        kind: String,
        /// The operation.
        access: LAccess,
        /// First handler's fragment.
        first: &'static str,
        /// Second handler's fragment.
        second: &'static str,
    },

    /// Two handlers for one control operation.
    #[error("kind `{kind}`: control `{access}` handled by both `{first}` and `{second}`")]
    DuplicateControl {
        /// Kind name.
        kind: String,
        /// The operation.
        access: LAccess,
        /// First handler's fragment.
        first: &'static str,
        /// Second handler's fragment.
        second: &'static str,
    },

    /// A sense handler registered for an operation that takes several
    /// parameters.
    #[error("kind `{kind}`: fragment `{fragment}` senses `{access}`, which is not senseable")]
    NotSenseable {
        /// Kind name.
        kind: String,
        /// Fragment name.
        fragment: &'static str,
        /// The operation.
        access: LAccess,
    },

    /// A control handler registered for a parameterless operation.
    #[error("kind `{kind}`: fragment `{fragment}` controls `{access}`, which takes no parameters")]
    NotControllable {
        /// Kind name.
        kind: String,
        /// Fragment name.
        fragment: &'static str,
        /// The operation.
        access: LAccess,
    },

    /// A kind lists a fragment the registry does not know.
    #[error("kind `{kind}` references unknown fragment `{fragment}`")]
    UnknownFragment {
        /// Kind name.
        kind: String,
        /// Fragment name.
        fragment: String,
    },

    /// Two kinds with the same name.
    #[error("kind `{0}` declared twice")]
    DuplicateKind(String),

    /// Two fragments with the same name.
    #[error("fragment `{0}` registered twice")]
    DuplicateFragment(String),

    /// Two capabilities with the same name. Every fragment implicitly defines
    /// a capability named after itself.
    #[error("capability `{0}` defined twice")]
    DuplicateCapability(String),

    /// More capabilities than a capability id can address.
    #[error("too many capabilities ({0})")]
    TooManyCapabilities(usize),

    /// Every class id is taken.
    #[error("no free class id left for kind `{kind}`")]
    ClassIdsExhausted {
        /// The kind that could not be assigned.
        kind: String,
    },
}
