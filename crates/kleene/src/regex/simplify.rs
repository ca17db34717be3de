//! Structural simplification. Rewrites work on the tree, so the result does not
//! depend on the order rules are tried in:
//!
//! - `∅` is absorbed by concatenation and dropped from unions
//! - `ε` is dropped from concatenations, and from unions that are already nullable
//! - `ε*` and `∅*` become `ε`, `(X*)*` becomes `X*`, `(ε|X)*` becomes `X*`
//! - nested unions and concatenations are flattened, repeated alternatives removed
//!
//! Parentheses are never stored, [`Regex`]'s `Display` prints only the ones the
//! grammar needs.

use log::trace;

use super::Regex;
use crate::error::RegexError;

// each pass is a full bottom-up rebuild, so one pass normally reaches the fixed point
const MAX_PASSES: usize = 16;

impl Regex {
    /// Union that keeps the result flat and free of `∅` and duplicates.
    pub fn union(alternates: impl IntoIterator<Item = Regex>) -> Regex {
        let mut flat: Vec<Regex> = Vec::new();
        for alternate in alternates {
            match alternate {
                Regex::EmptySet => {}
                Regex::Alternation(inner) => {
                    for re in inner {
                        if !flat.contains(&re) {
                            flat.push(re);
                        }
                    }
                }
                re => {
                    if !flat.contains(&re) {
                        flat.push(re);
                    }
                }
            }
        }

        if flat.len() > 1 && flat.iter().any(|re| *re != Regex::Epsilon && re.nullable()) {
            flat.retain(|re| *re != Regex::Epsilon);
        }

        match flat.len() {
            0 => Regex::EmptySet,
            1 => flat.pop().expect("Must be nonempty"),
            _ => Regex::Alternation(flat),
        }
    }

    /// Concatenation that absorbs `∅` and drops `ε`.
    pub fn concat(factors: impl IntoIterator<Item = Regex>) -> Regex {
        let mut flat: Vec<Regex> = Vec::new();
        for factor in factors {
            match factor {
                Regex::EmptySet => return Regex::EmptySet,
                Regex::Epsilon => {}
                Regex::Concatenation(inner) => flat.extend(inner),
                re => flat.push(re),
            }
        }

        match flat.len() {
            0 => Regex::Epsilon,
            1 => flat.pop().expect("Must be nonempty"),
            _ => Regex::Concatenation(flat),
        }
    }

    pub fn star(inner: Regex) -> Regex {
        match inner {
            Regex::EmptySet | Regex::Epsilon => Regex::Epsilon,
            Regex::Kleene(_) => inner,
            Regex::Alternation(alternates) if alternates.contains(&Regex::Epsilon) => {
                let rest = alternates.into_iter().filter(|re| *re != Regex::Epsilon);
                Regex::star(Regex::union(rest))
            }
            _ => Regex::Kleene(Box::new(inner)),
        }
    }

    fn rewrite(&self) -> Regex {
        match self {
            Regex::Alternation(alternates) => Regex::union(alternates.iter().map(Regex::rewrite)),
            Regex::Concatenation(factors) => Regex::concat(factors.iter().map(Regex::rewrite)),
            Regex::Kleene(inner) => Regex::star(inner.rewrite()),
            Regex::Char(_) | Regex::Epsilon | Regex::EmptySet => self.clone(),
        }
    }

    /// Applies the rewrite rules until a pass changes nothing.
    pub fn simplified(&self) -> Regex {
        let mut current = self.clone();
        for pass in 0..MAX_PASSES {
            let next = current.rewrite();
            if next == current {
                trace!("simplification reached a fixed point after {} passes", pass);
                break;
            }
            current = next;
        }
        current
    }
}

/// Parses, simplifies and prints a regex fragment.
pub fn simplify(re_str: &str) -> Result<String, RegexError> {
    let re: Regex = re_str.parse()?;
    Ok(re.simplified().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simp(re_str: &str) -> String {
        simplify(re_str).expect("failed to parse regex")
    }

    #[test]
    fn empty_set_rules() {
        assert_eq!(simp("∅*"), "ε");
        assert_eq!(simp("a∅b"), "∅");
        assert_eq!(simp("∅|a"), "a");
        assert_eq!(simp("a|∅"), "a");
        assert_eq!(simp("∅|∅"), "∅");
    }

    #[test]
    fn epsilon_rules() {
        assert_eq!(simp("ε*"), "ε");
        assert_eq!(simp("εaε"), "a");
        assert_eq!(simp("ε|ε"), "ε");
        assert_eq!(simp("a|ε"), "a|ε");
        assert_eq!(simp("a*|ε"), "a*");
        assert_eq!(simp("(ε|a)*"), "a*");
    }

    #[test]
    fn structural_rules() {
        assert_eq!(simp("((a))"), "a");
        assert_eq!(simp("(a|b)|(b|a)"), "a|b");
        assert_eq!(simp("(a*)*"), "a*");
        assert_eq!(simp("a(bc)"), "abc");
        assert_eq!(simp("(ab|ab)*"), "(ab)*");
    }

    #[test]
    fn idempotent() {
        for re_str in ["(a|ε)(b∅|c)*", "((a*)*|ε)b", "(ε|a|b)*(ab|a(b))", "∅", "ε", "x"] {
            let once = simp(re_str);
            assert_eq!(simp(&once), once, "'{}'", re_str);
        }
    }

    #[test]
    fn parse_errors_are_reported() {
        assert!(simplify("(a").is_err());
    }
}
