// Formula rendering seam. The renderer is a trait so the graph and the
// controller never depend on how labels are displayed. Rendering is
// best-effort per region: a failed formula keeps its raw text.

use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum TypesetError {
    #[error("unbalanced braces in formula {0:?}")]
    UnbalancedBraces(String),
    #[error("unknown command \\{command} in formula {formula:?}")]
    UnknownCommand { command: String, formula: String },
}

/// Rewrites one formula region into display form.
pub trait FormulaRenderer {
    fn typeset(&self, formula: &str) -> Result<String, TypesetError>;
}

/// Built-in renderer: translates the TeX-ish markup of the catalog into
/// plain unicode text (`\(E=mc^2\)` becomes `E=mc²`).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UnicodeFormatter;

impl FormulaRenderer for UnicodeFormatter {
    fn typeset(&self, formula: &str) -> Result<String, TypesetError> {
        let body = strip_delimiters(formula);
        let chars: Vec<char> = body.chars().collect();
        let mut pos = 0;
        let out = rewrite(&chars, &mut pos, formula, None)?;
        Ok(out.trim().to_string())
    }
}

/// Drop the `\( ... \)` inline-math wrapper if present.
fn strip_delimiters(formula: &str) -> &str {
    formula
        .strip_prefix(r"\(")
        .and_then(|s| s.strip_suffix(r"\)"))
        .unwrap_or(formula)
        .trim()
}

fn superscript(c: char) -> Option<char> {
    match c {
        '0' => Some('⁰'),
        '1' => Some('¹'),
        '2' => Some('²'),
        '3' => Some('³'),
        '4' => Some('⁴'),
        '5' => Some('⁵'),
        '6' => Some('⁶'),
        '7' => Some('⁷'),
        '8' => Some('⁸'),
        '9' => Some('⁹'),
        _ => None,
    }
}

fn subscript(c: char) -> Option<char> {
    match c {
        '0' => Some('₀'),
        '1' => Some('₁'),
        '2' => Some('₂'),
        '3' => Some('₃'),
        '4' => Some('₄'),
        '5' => Some('₅'),
        '6' => Some('₆'),
        '7' => Some('₇'),
        '8' => Some('₈'),
        '9' => Some('₉'),
        'k' => Some('ₖ'),
        'r' => Some('ᵣ'),
        's' => Some('ₛ'),
        _ => None,
    }
}

/// Rewrite until `stop` (a closing brace) or end of input. `pos` is left
/// one past the stop character.
fn rewrite(
    chars: &[char],
    pos: &mut usize,
    formula: &str,
    stop: Option<char>,
) -> Result<String, TypesetError> {
    let mut out = String::new();

    while *pos < chars.len() {
        let c = chars[*pos];
        if Some(c) == stop {
            *pos += 1;
            return Ok(out);
        }
        match c {
            '\\' => {
                *pos += 1;
                out.push_str(&rewrite_command(chars, pos, formula)?);
            }
            '{' => {
                *pos += 1;
                out.push_str(&rewrite(chars, pos, formula, Some('}'))?);
            }
            '^' | '_' => {
                *pos += 1;
                out.push_str(&rewrite_script(chars, pos, formula, c == '^')?);
            }
            _ => {
                out.push(c);
                *pos += 1;
            }
        }
    }

    if stop.is_some() {
        return Err(TypesetError::UnbalancedBraces(formula.to_string()));
    }
    Ok(out)
}

fn parse_group(
    chars: &[char],
    pos: &mut usize,
    formula: &str,
) -> Result<String, TypesetError> {
    while *pos < chars.len() && chars[*pos] == ' ' {
        *pos += 1;
    }
    if *pos >= chars.len() || chars[*pos] != '{' {
        return Err(TypesetError::UnbalancedBraces(formula.to_string()));
    }
    *pos += 1;
    rewrite(chars, pos, formula, Some('}'))
}

/// Parenthesize a fraction part unless it is a single short token.
fn fraction_part(part: &str) -> String {
    if part.contains(' ') || part.chars().count() > 3 {
        format!("({part})")
    } else {
        part.to_string()
    }
}

fn rewrite_command(
    chars: &[char],
    pos: &mut usize,
    formula: &str,
) -> Result<String, TypesetError> {
    let mut command = String::new();
    while *pos < chars.len() && chars[*pos].is_ascii_alphabetic() {
        command.push(chars[*pos]);
        *pos += 1;
    }

    let symbol = |s: &str| Ok(s.to_string());
    match command.as_str() {
        "frac" => {
            let numerator = parse_group(chars, pos, formula)?;
            let denominator = parse_group(chars, pos, formula)?;
            Ok(format!(
                "{}/{}",
                fraction_part(&numerator),
                fraction_part(&denominator)
            ))
        }
        "sqrt" => {
            let body = parse_group(chars, pos, formula)?;
            Ok(format!("√({body})"))
        }
        "lambda" => symbol("λ"),
        "Omega" => symbol("Ω"),
        "Delta" => {
            // TeX swallows the space after a command, so "\Delta E"
            // reads "ΔE".
            if *pos < chars.len() && chars[*pos] == ' ' {
                *pos += 1;
            }
            symbol("Δ")
        }
        "pi" => symbol("π"),
        "geq" => symbol("≥"),
        "pm" => symbol("±"),
        "ln" => symbol("ln"),
        // Sizing-only delimiters; the following bracket stays.
        "left" | "right" => symbol(""),
        _ => Err(TypesetError::UnknownCommand {
            command,
            formula: formula.to_string(),
        }),
    }
}

fn rewrite_script(
    chars: &[char],
    pos: &mut usize,
    formula: &str,
    raised: bool,
) -> Result<String, TypesetError> {
    let map = if raised { superscript } else { subscript };
    let marker = if raised { '^' } else { '_' };

    let body = if *pos < chars.len() && chars[*pos] == '{' {
        *pos += 1;
        rewrite(chars, pos, formula, Some('}'))?
    } else if *pos < chars.len() {
        let c = chars[*pos];
        *pos += 1;
        c.to_string()
    } else {
        return Ok(marker.to_string());
    };

    let mapped: Option<String> = body.chars().map(map).collect();
    Ok(mapped.unwrap_or_else(|| format!("{marker}{body}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typeset(formula: &str) -> Result<String, TypesetError> {
        UnicodeFormatter.typeset(formula)
    }

    #[test]
    fn simple_equation() {
        assert_eq!(typeset(r"\(E=mc^2\)").unwrap(), "E=mc²");
    }

    #[test]
    fn fraction_and_sqrt() {
        assert_eq!(typeset(r"\(m = \frac{E}{c^2}\)").unwrap(), "m = E/c²");
        assert_eq!(
            typeset(r"\(c = \sqrt{\frac{E}{m}}\)").unwrap(),
            "c = √(E/m)"
        );
    }

    #[test]
    fn greek_letters_and_relations() {
        assert_eq!(typeset(r"\(\lambda\)").unwrap(), "λ");
        assert_eq!(
            typeset(r"\(S = k \ln \Omega\)").unwrap(),
            "S = k ln Ω"
        );
        assert_eq!(
            typeset(r"\(\Delta S \geq \frac{Q}{T}\)").unwrap(),
            "ΔS ≥ Q/T"
        );
    }

    #[test]
    fn subscripts_and_uncertainty() {
        assert_eq!(
            typeset(r"\(F = G\frac{m_1m_2}{r^2}\)").unwrap(),
            "F = G(m₁m₂)/r²"
        );
        assert_eq!(
            typeset(r"\(\Delta E \Delta t \geq \frac{h}{4\pi}\)").unwrap(),
            "ΔE Δt ≥ h/4π"
        );
    }

    #[test]
    fn doppler_with_sized_delimiters() {
        assert_eq!(
            typeset(r"\(f' = f\left(\frac{c \pm v_r}{c \pm v_s}\right)\)").unwrap(),
            "f' = f((c ± vᵣ)/(c ± vₛ))"
        );
    }

    #[test]
    fn missing_delimiters_are_tolerated() {
        assert_eq!(typeset("p=mv").unwrap(), "p=mv");
    }

    #[test]
    fn unbalanced_braces_fail() {
        assert_eq!(
            typeset(r"\(\frac{E}{m\)"),
            Err(TypesetError::UnbalancedBraces(r"\(\frac{E}{m\)".to_string()))
        );
    }

    #[test]
    fn unknown_commands_fail() {
        assert!(matches!(
            typeset(r"\(\oint E\)"),
            Err(TypesetError::UnknownCommand { .. })
        ));
    }

    #[test]
    fn whole_catalog_typesets() {
        let catalog = crate::catalog::load_catalog().unwrap();
        let check = |formula: &str| {
            UnicodeFormatter
                .typeset(formula)
                .unwrap_or_else(|e| panic!("{formula}: {e}"));
        };
        for c in &catalog.constants {
            check(c.formula);
        }
        for v in &catalog.variables {
            check(v.formula);
        }
        for eq in &catalog.equations {
            check(eq.formula);
            for d in eq.derivations {
                check(d.formula);
            }
        }
    }
}
