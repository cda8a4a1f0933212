use crate::prob::*;
use thiserror::Error;

/// Failure to interpret one line of the input as a record.
#[derive(Debug, Error)]
pub enum RecordError {

    #[error("Line {line}: expected 3 fields (gender, height, weight), found {found}")]
    Arity { line : usize, found : usize },

    #[error("Line {line}: invalid character '{ch}' (expected '0', '1' or '-')")]
    InvalidChar { line : usize, ch : char },

    #[error("Error reading records: {0}")]
    Io(#[from] std::io::Error)

}

/// One observation. Gender is None when it was not recorded; effects hold
/// whether height and weight take their reference value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record {

    pub gender : Option<bool>,

    pub effects : [bool; 2]

}

impl Record {

    /// Parses a line of three characters drawn from '0', '1' and '-', ignoring whitespace.
    /// A '-' in the gender position marks the gender as missing; anywhere else it counts as
    /// a zero bit. Blank lines yield Ok(None). The informed line number is only used
    /// for error messages.
    pub fn parse(text : &str, line : usize) -> Result<Option<Self>, RecordError> {
        let mut bits = Vec::with_capacity(3);
        for ch in text.chars().filter(|c| !c.is_whitespace() ) {
            match ch {
                '0' | '1' | '-' => bits.push(ch),
                _ => return Err(RecordError::InvalidChar { line, ch })
            }
        }
        if bits.is_empty() {
            return Ok(None);
        }
        if bits.len() != 3 {
            return Err(RecordError::Arity { line, found : bits.len() });
        }
        let gender = match bits[0] {
            '-' => None,
            c => Some(c == '1')
        };
        Ok(Some(Self { gender, effects : [bits[1] == '1', bits[2] == '1'] }))
    }

    /// 2-bit (height, weight) index, available whether or not gender is known.
    pub fn effect_combo(&self) -> usize {
        (self.effects[0] as usize) << 1 | self.effects[1] as usize
    }

    /// 3-bit (gender, height, weight) index, only when gender was recorded.
    pub fn full_combo(&self) -> Option<usize> {
        self.gender.map(|g| full_combo(!g, self.effect_combo()) )
    }

}

#[test]
fn parse_records() {
    let r = Record::parse("1 0 1", 1).unwrap().unwrap();
    assert_eq!(r.gender, Some(true));
    assert_eq!(r.full_combo(), Some(0b101));

    let r = Record::parse("011", 2).unwrap().unwrap();
    assert_eq!(r.full_combo(), Some(0b011));

    let r = Record::parse("- 1 0", 3).unwrap().unwrap();
    assert_eq!(r.gender, None);
    assert_eq!(r.full_combo(), None);
    assert_eq!(r.effect_combo(), 0b10);

    // A dash outside the gender column is a zero bit.
    let r = Record::parse("1 - 1", 4).unwrap().unwrap();
    assert_eq!(r.full_combo(), Some(0b101));

    assert!(Record::parse("   \t", 5).unwrap().is_none());
}

#[test]
fn reject_malformed() {
    match Record::parse("1 0", 7) {
        Err(RecordError::Arity { line : 7, found : 2 }) => { },
        other => panic!("Unexpected {:?}", other)
    }
    match Record::parse("1 x 0", 8) {
        Err(RecordError::InvalidChar { line : 8, ch : 'x' }) => { },
        other => panic!("Unexpected {:?}", other)
    }
}
