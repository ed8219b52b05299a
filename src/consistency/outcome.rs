use serde::Serialize;

/// A secondary bookkeeping write that failed after the primary write committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecondaryEffectWarning {
    /// Name of the derived write, e.g. `chapter_count`.
    pub effect: &'static str,
    pub story_id: String,
    pub message: String,
}

/// The result of an operation whose primary write succeeded.
///
/// Secondary effects that failed are reported in `warnings` instead of
/// failing the operation; the caller decides whether to surface or repair them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome<T> {
    #[serde(rename = "data")]
    pub value: T,
    pub warnings: Vec<SecondaryEffectWarning>,
}

impl<T> Outcome<T> {
    pub fn clean(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn warn(&mut self, warning: SecondaryEffectWarning) {
        self.warnings.push(warning);
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            warnings: self.warnings,
        }
    }
}
