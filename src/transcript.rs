use std::fmt;

/// One labeled block of toolchain output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptBlock {
    pub label: String,
    pub text: String,
}

/// Append-only record of every step a request actually ran, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    blocks: Vec<TranscriptBlock>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, label: impl Into<String>, text: impl Into<String>) {
        self.blocks.push(TranscriptBlock {
            label: label.into(),
            text: text.into(),
        });
    }

    pub fn blocks(&self) -> &[TranscriptBlock] {
        &self.blocks
    }

    pub fn labels(&self) -> Vec<&str> {
        self.blocks.iter().map(|b| b.label.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for block in &self.blocks {
            writeln!(f, "--- {} ---", block.label)?;
            writeln!(f, "{}", block.text)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_in_order() {
        let mut transcript = Transcript::new();
        transcript.push("Init", "Terraform has been successfully initialized!");
        transcript.push("Plan", "Plan: 1 to add, 0 to change, 0 to destroy.");

        assert_eq!(
            transcript.to_string(),
            "--- Init ---\nTerraform has been successfully initialized!\n\
             --- Plan ---\nPlan: 1 to add, 0 to change, 0 to destroy.\n"
        );
        assert_eq!(transcript.labels(), vec!["Init", "Plan"]);
    }

    #[test]
    fn test_empty_renders_nothing() {
        let transcript = Transcript::new();
        assert!(transcript.is_empty());
        assert_eq!(transcript.to_string(), "");
    }
}
