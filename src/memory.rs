use crate::error::Result;
use crate::message::Turn;

/// In-memory transcript of one user's conversation.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn with_turns(turns: Vec<Turn>) -> Self {
        Self { turns }
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Turn> + '_ {
        self.turns.iter()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Encodes every turn, in order, as a single JSON array of
    /// `{"role", "content"}` objects.
    pub fn to_payload(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.turns)?)
    }

    pub fn from_payload(raw: &str) -> Result<Self> {
        Ok(Self::with_turns(serde_json::from_str(raw)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;

    #[test]
    fn payload_keeps_order_and_roles() {
        let mut transcript = Transcript::default();
        transcript.push(Turn::user("hello"));
        transcript.push(Turn::assistant("hi there"));
        transcript.push(Turn::user("quiero un \"gallo pinto\"\nrápido"));

        let payload = transcript.to_payload().unwrap();
        assert_eq!(
            payload,
            r#"[{"role":"user","content":"hello"},{"role":"assistant","content":"hi there"},{"role":"user","content":"quiero un \"gallo pinto\"\nrápido"}]"#
        );

        let decoded = Transcript::from_payload(&payload).unwrap();
        assert_eq!(decoded, transcript);
        assert_eq!(decoded.turns()[1].role(), Role::Assistant);
    }

    #[test]
    fn empty_transcript_encodes_as_empty_array() {
        assert_eq!(Transcript::default().to_payload().unwrap(), "[]");
    }
}
