//! BIFF8 formula token (PTG) decoding.
//!
//! Reconstructs an infix formula string from the reverse-Polish token
//! stream stored in FORMULA/SHRFMLA records. This is a textual decoder,
//! not an evaluator: tokens push and combine text fragments on a stack
//! and the stack top at end-of-input is the formula body (without the
//! leading `=`).
//!
//! Token space:
//! - 0x01-0x1F are classless base tokens (operators, literals, tAttr)
//! - tokens >= 0x20 carry a class tag in bits 5-6 (VALUE/REFERENCE/ARRAY)
//!   which is irrelevant for text reconstruction and masked off
//!
//! An unrecognised token or truncated operand stops emission; whatever is
//! on top of the stack at that point is returned as the partial formula.

use gridbook_core::{column_name, CellError};

use crate::error::FormulaError;
use crate::functions::{fixed_arg_count, function_name};

// Base tokens (classless)
const PTG_ADD: u8 = 0x03;
const PTG_SUB: u8 = 0x04;
const PTG_MUL: u8 = 0x05;
const PTG_DIV: u8 = 0x06;
const PTG_POWER: u8 = 0x07;
const PTG_CONCAT: u8 = 0x08;
const PTG_LT: u8 = 0x09;
const PTG_LE: u8 = 0x0A;
const PTG_EQ: u8 = 0x0B;
const PTG_GE: u8 = 0x0C;
const PTG_GT: u8 = 0x0D;
const PTG_NE: u8 = 0x0E;
const PTG_ISECT: u8 = 0x0F;
const PTG_UNION: u8 = 0x10;
const PTG_RANGE: u8 = 0x11;
const PTG_UPLUS: u8 = 0x12;
const PTG_UMINUS: u8 = 0x13;
const PTG_PERCENT: u8 = 0x14;
const PTG_PAREN: u8 = 0x15;
const PTG_MISSARG: u8 = 0x16;
const PTG_STR: u8 = 0x17;
const PTG_ATTR: u8 = 0x19;
const PTG_ERR: u8 = 0x1C;
const PTG_BOOL: u8 = 0x1D;
const PTG_INT: u8 = 0x1E;
const PTG_NUM: u8 = 0x1F;

// Class-bearing tokens, normalised to the VALUE class (0x20 | low 5 bits)
const PTG_ARRAY: u8 = 0x20;
const PTG_FUNC: u8 = 0x21;
const PTG_FUNC_VAR: u8 = 0x22;
const PTG_NAME: u8 = 0x23;
const PTG_REF: u8 = 0x24;
const PTG_AREA: u8 = 0x25;
const PTG_MEM_AREA: u8 = 0x26;
const PTG_MEM_ERR: u8 = 0x27;
const PTG_REF_ERR: u8 = 0x2A;
const PTG_AREA_ERR: u8 = 0x2B;
const PTG_REF_N: u8 = 0x2C;
const PTG_AREA_N: u8 = 0x2D;

/// The user-defined-function escape in the function table.
const FUNC_USER_DEFINED: u16 = 255;

/// Cell coordinates a formula is decoded against.
///
/// `target` is the cell the formula instance lives in; `base` is the
/// top-left anchor of the shared-formula range it came from. Relative
/// reference offsets resolve against the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellContext {
    pub target_row: u32,
    pub target_col: u32,
    pub base_row: u32,
    pub base_col: u32,
}

impl CellContext {
    /// Context for a standalone formula cell (base == target).
    pub fn at(row: u32, col: u32) -> Self {
        Self {
            target_row: row,
            target_col: col,
            base_row: row,
            base_col: col,
        }
    }
}

/// Decode a PTG token stream into formula text (no leading `=`).
///
/// Empty input yields an empty string. Decoding never fails: malformed
/// streams produce the best partial formula the stack holds.
pub fn decode_ptg(tokens: &[u8], context: Option<&CellContext>) -> String {
    let mut decoder = Decoder {
        data: tokens,
        pos: 0,
        stack: Vec::new(),
        context,
    };

    while decoder.pos < decoder.data.len() {
        match decoder.step() {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                log::warn!("formula token stream stopped early: {e}");
                break;
            }
        }
    }

    decoder.stack.pop().unwrap_or_default()
}

struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
    stack: Vec<String>,
    context: Option<&'a CellContext>,
}

impl Decoder<'_> {
    /// Process one token. `Ok(false)` means an unknown token was hit and
    /// emission stops.
    fn step(&mut self) -> Result<bool, FormulaError> {
        let token = self.u8()?;
        let base = if token >= 0x20 {
            0x20 | (token & 0x1F)
        } else {
            token
        };

        match base {
            PTG_ADD => self.binary("+")?,
            PTG_SUB => self.binary("-")?,
            PTG_MUL => self.binary("*")?,
            PTG_DIV => self.binary("/")?,
            PTG_POWER => self.binary("^")?,
            PTG_CONCAT => self.binary("&")?,
            PTG_LT => self.binary("<")?,
            PTG_LE => self.binary("<=")?,
            PTG_EQ => self.binary("=")?,
            PTG_GE => self.binary(">=")?,
            PTG_GT => self.binary(">")?,
            PTG_NE => self.binary("<>")?,
            PTG_ISECT => self.binary(" ")?,
            PTG_UNION => self.binary(",")?,
            PTG_RANGE => self.binary(":")?,

            PTG_UPLUS => {
                let v = self.pop()?;
                self.stack.push(format!("+{v}"));
            }
            PTG_UMINUS => {
                let v = self.pop()?;
                self.stack.push(format!("-{v}"));
            }
            PTG_PERCENT => {
                let v = self.pop()?;
                self.stack.push(format!("{v}%"));
            }
            PTG_PAREN => {
                let v = self.pop()?;
                self.stack.push(format!("({v})"));
            }

            PTG_MISSARG => self.stack.push(String::new()),
            PTG_STR => {
                let s = self.pascal_string()?;
                self.stack.push(format!("\"{}\"", s.replace('"', "\"\"")));
            }
            PTG_ATTR => {
                // Control-flow metadata (IF/CHOOSE jump optimisation):
                // type byte + 16-bit data, no stack effect.
                self.skip(3)?;
            }
            PTG_ERR => {
                let code = self.u8()?;
                self.stack.push(CellError::from_biff_code(code).to_string());
            }
            PTG_BOOL => {
                let b = self.u8()?;
                self.stack.push(if b != 0 { "TRUE" } else { "FALSE" }.into());
            }
            PTG_INT => {
                let v = self.u16()?;
                self.stack.push(v.to_string());
            }
            PTG_NUM => {
                let v = self.f64()?;
                self.stack.push(format_number(v));
            }

            PTG_FUNC => {
                let index = self.u16()?;
                let argc = fixed_arg_count(index);
                self.call(index, argc)?;
            }
            PTG_FUNC_VAR => {
                // High bit of the count is the command-equivalent flag,
                // high bit of the index is the prompt flag.
                let argc = self.u8()? & 0x7F;
                let index = self.u16()? & 0x7FFF;
                self.call(index, argc)?;
            }
            PTG_NAME => {
                let index = self.u16()?;
                self.skip(2)?;
                self.stack.push(format!("NAME{index}"));
            }
            PTG_REF => {
                let row_word = self.u16()?;
                let col_word = self.u16()?;
                let text = self.render_ref(row_word, col_word, false);
                self.stack.push(text);
            }
            PTG_AREA => {
                let row1 = self.u16()?;
                let row2 = self.u16()?;
                let col1 = self.u16()?;
                let col2 = self.u16()?;
                let a = self.render_ref(row1, col1, false);
                let b = self.render_ref(row2, col2, false);
                self.stack.push(format!("{a}:{b}"));
            }
            PTG_REF_N => {
                let row_word = self.u16()?;
                let col_word = self.u16()?;
                let text = self.render_ref(row_word, col_word, true);
                self.stack.push(text);
            }
            PTG_AREA_N => {
                let row1 = self.u16()?;
                let row2 = self.u16()?;
                let col1 = self.u16()?;
                let col2 = self.u16()?;
                let a = self.render_ref(row1, col1, true);
                let b = self.render_ref(row2, col2, true);
                self.stack.push(format!("{a}:{b}"));
            }
            PTG_REF_ERR => {
                self.skip(4)?;
                self.stack.push(CellError::Ref.to_string());
            }
            PTG_AREA_ERR => {
                self.skip(8)?;
                self.stack.push(CellError::Ref.to_string());
            }
            PTG_ARRAY => {
                // Constant data lives in the record's trailing block, which
                // is not part of the token stream.
                self.skip(7)?;
                self.stack.push("{ARRAY}".into());
            }
            PTG_MEM_AREA => {
                // Pre-computed range metadata; the real sub-expression
                // follows inline.
                self.skip(6)?;
            }
            PTG_MEM_ERR => {
                self.skip(6)?;
            }

            other => {
                log::debug!("unknown formula token 0x{other:02X}, stopping emission");
                return Ok(false);
            }
        }

        Ok(true)
    }

    // ── Stack helpers ────────────────────────────────────────────────────

    fn pop(&mut self) -> Result<String, FormulaError> {
        self.stack.pop().ok_or(FormulaError::StackUnderflow)
    }

    fn binary(&mut self, op: &str) -> Result<(), FormulaError> {
        let right = self.pop()?;
        let left = self.pop()?;
        self.stack.push(format!("{left}{op}{right}"));
        Ok(())
    }

    fn call(&mut self, index: u16, argc: u8) -> Result<(), FormulaError> {
        let mut args = Vec::with_capacity(argc as usize);
        for _ in 0..argc {
            args.push(self.pop()?);
        }
        args.reverse();

        let rendered = if index == FUNC_USER_DEFINED {
            // The attached name travels as the first argument.
            let name = if args.is_empty() {
                format!("FUNC{index}")
            } else {
                args.remove(0)
            };
            format!("{name}({})", args.join(","))
        } else {
            let name = function_name(index)
                .map(str::to_string)
                .unwrap_or_else(|| format!("FUNC{index}"));
            format!("{name}({})", args.join(","))
        };

        self.stack.push(rendered);
        Ok(())
    }

    // ── Reference rendering ──────────────────────────────────────────────

    /// Render one reference half. The row word holds a 14-bit row; the
    /// column word holds an 8-bit column plus the relativity flags
    /// (bit 15 = row relative, bit 14 = column relative).
    ///
    /// `offsets` forces tRefN semantics: relative components are offsets
    /// from the context target regardless of the other component.
    fn render_ref(&self, row_word: u16, col_word: u16, offsets: bool) -> String {
        let row_rel = col_word & 0x8000 != 0;
        let col_rel = col_word & 0x4000 != 0;
        let raw_row = row_word & 0x3FFF;
        let raw_col = (col_word & 0x00FF) as u8;

        if let Some(ctx) = self.context {
            let as_offsets = offsets || (row_rel && col_rel);
            if as_offsets {
                let row = if row_rel {
                    clamp(ctx.target_row as i64 + sign_extend_14(raw_row) as i64)
                } else {
                    raw_row as u32
                };
                let col = if col_rel {
                    clamp(ctx.target_col as i64 + sign_extend_8(raw_col) as i64)
                } else {
                    raw_col as u32
                };
                let mut out = String::new();
                if !col_rel {
                    out.push('$');
                }
                out.push_str(&column_name(col));
                if !row_rel {
                    out.push('$');
                }
                out.push_str(&(row + 1).to_string());
                return out;
            }
        }

        let mut out = String::new();
        if !col_rel {
            out.push('$');
        }
        out.push_str(&column_name(raw_col as u32));
        if !row_rel {
            out.push('$');
        }
        out.push_str(&(raw_row as u32 + 1).to_string());
        out
    }

    // ── Byte readers ─────────────────────────────────────────────────────

    fn u8(&mut self) -> Result<u8, FormulaError> {
        let v = *self
            .data
            .get(self.pos)
            .ok_or(FormulaError::Truncated { offset: self.pos })?;
        self.pos += 1;
        Ok(v)
    }

    fn u16(&mut self) -> Result<u16, FormulaError> {
        if self.pos + 2 > self.data.len() {
            return Err(FormulaError::Truncated { offset: self.pos });
        }
        let v = u16::from_le_bytes([self.data[self.pos], self.data[self.pos + 1]]);
        self.pos += 2;
        Ok(v)
    }

    fn f64(&mut self) -> Result<f64, FormulaError> {
        if self.pos + 8 > self.data.len() {
            return Err(FormulaError::Truncated { offset: self.pos });
        }
        let bytes: [u8; 8] = self.data[self.pos..self.pos + 8].try_into().unwrap();
        self.pos += 8;
        Ok(f64::from_le_bytes(bytes))
    }

    fn skip(&mut self, n: usize) -> Result<(), FormulaError> {
        if self.pos + n > self.data.len() {
            return Err(FormulaError::Truncated { offset: self.pos });
        }
        self.pos += n;
        Ok(())
    }

    /// BIFF8 inline string: length byte, options byte (bit 0 = wide),
    /// then characters.
    fn pascal_string(&mut self) -> Result<String, FormulaError> {
        let count = self.u8()? as usize;
        let flags = self.u8()?;
        if flags & 0x01 != 0 {
            if self.pos + count * 2 > self.data.len() {
                return Err(FormulaError::Truncated { offset: self.pos });
            }
            let mut units = Vec::with_capacity(count);
            for i in 0..count {
                units.push(u16::from_le_bytes([
                    self.data[self.pos + i * 2],
                    self.data[self.pos + i * 2 + 1],
                ]));
            }
            self.pos += count * 2;
            Ok(String::from_utf16_lossy(&units))
        } else {
            if self.pos + count > self.data.len() {
                return Err(FormulaError::Truncated { offset: self.pos });
            }
            let s = self.data[self.pos..self.pos + count]
                .iter()
                .map(|&b| b as char)
                .collect();
            self.pos += count;
            Ok(s)
        }
    }
}

/// Sign-extend a 14-bit row offset (bit 13 is the sign).
fn sign_extend_14(v: u16) -> i16 {
    if v & 0x2000 != 0 {
        (v | 0xC000) as i16
    } else {
        v as i16
    }
}

/// Sign-extend an 8-bit column offset.
fn sign_extend_8(v: u8) -> i8 {
    v as i8
}

fn clamp(v: i64) -> u32 {
    v.max(0) as u32
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Convenience: decode and attach the leading `=`, or `None` for an empty
/// or fully-undecodable stream.
pub fn decode_formula(tokens: &[u8], context: Option<&CellContext>) -> Option<String> {
    let body = decode_ptg(tokens, context);
    if body.is_empty() {
        None
    } else {
        Some(format!("={body}"))
    }
}

/// True when a FORMULA cell's token stream opens with the shared-formula
/// escape (tExp) and must be resolved against a SHRFMLA body.
pub fn is_shared_formula_ref(tokens: &[u8]) -> bool {
    tokens.first() == Some(&0x01)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridbook_core::cell_name as a1;

    #[test]
    fn test_empty_input() {
        assert_eq!(decode_ptg(&[], None), "");
    }

    #[test]
    fn test_int_addition() {
        // tInt 2, tInt 3, tAdd
        let tokens = [0x1E, 0x02, 0x00, 0x1E, 0x03, 0x00, 0x03];
        assert_eq!(decode_ptg(&tokens, None), "2+3");
    }

    #[test]
    fn test_func_var_sum() {
        // tInt 10, tInt 20, tFuncVar(argc=2, index=4)
        let tokens = [0x1E, 0x0A, 0x00, 0x1E, 0x14, 0x00, 0x22, 0x02, 0x04, 0x00];
        assert_eq!(decode_ptg(&tokens, None), "SUM(10,20)");
    }

    #[test]
    fn test_fixed_func() {
        // tNum 3.0, tFunc(SIN = 15)
        let mut tokens = vec![0x1F];
        tokens.extend_from_slice(&3.0f64.to_le_bytes());
        tokens.extend_from_slice(&[0x21, 0x0F, 0x00]);
        assert_eq!(decode_ptg(&tokens, None), "SIN(3)");
    }

    #[test]
    fn test_zero_arity_func() {
        // tFunc(PI = 19)
        let tokens = [0x21, 0x13, 0x00];
        assert_eq!(decode_ptg(&tokens, None), "PI()");
    }

    #[test]
    fn test_unknown_func_index_renders_placeholder() {
        // tFuncVar(argc=1, index=333), a gap in the table
        let tokens = [0x1E, 0x01, 0x00, 0x22, 0x01, 0x4D, 0x01];
        assert_eq!(decode_ptg(&tokens, None), "FUNC333(1)");
    }

    #[test]
    fn test_string_literal() {
        // tStr "Hi" (compressed), tStr "a\"b", tConcat
        let tokens = [
            0x17, 0x02, 0x00, b'H', b'i', 0x17, 0x03, 0x00, b'a', b'"', b'b', 0x08,
        ];
        assert_eq!(decode_ptg(&tokens, None), "\"Hi\"&\"a\"\"b\"");
    }

    #[test]
    fn test_bool_and_err() {
        let tokens = [0x1D, 0x01];
        assert_eq!(decode_ptg(&tokens, None), "TRUE");
        let tokens = [0x1C, 0x07];
        assert_eq!(decode_ptg(&tokens, None), "#DIV/0!");
    }

    #[test]
    fn test_unary_and_paren() {
        // tInt 5, tUminus, tParen
        let tokens = [0x1E, 0x05, 0x00, 0x13, 0x15];
        assert_eq!(decode_ptg(&tokens, None), "(-5)");
        // tInt 10, tPercent
        let tokens = [0x1E, 0x0A, 0x00, 0x14];
        assert_eq!(decode_ptg(&tokens, None), "10%");
    }

    #[test]
    fn test_attr_is_transparent() {
        // tAttr(volatile) then tInt 7
        let tokens = [0x19, 0x01, 0x00, 0x00, 0x1E, 0x07, 0x00];
        assert_eq!(decode_ptg(&tokens, None), "7");
    }

    #[test]
    fn test_ref_absolute_and_relative() {
        // tRef row=0 col_word=0xC000 (both relative, col 0) without context
        let tokens = [0x24, 0x00, 0x00, 0x00, 0xC0];
        assert_eq!(decode_ptg(&tokens, None), "A1");

        // tRef row=1 col_word=0x0001 (both absolute, col 1)
        let tokens = [0x24, 0x01, 0x00, 0x01, 0x00];
        assert_eq!(decode_ptg(&tokens, None), "$B$2");

        // Mixed: row absolute, column relative (bit 14 only)
        let tokens = [0x24, 0x04, 0x00, 0x02, 0x40];
        assert_eq!(decode_ptg(&tokens, None), "C$5");
    }

    #[test]
    fn test_area() {
        // tArea rows 0-1, cols 0-1, all relative
        let tokens = [0x25, 0x00, 0x00, 0x01, 0x00, 0x00, 0xC0, 0x01, 0xC0];
        assert_eq!(decode_ptg(&tokens, None), "A1:B2");
    }

    #[test]
    fn test_relative_refs_resolve_against_target() {
        // Shared-formula body: tRef(RC) + tRef(R[0]C[1]) + tAdd, decoded
        // for the cell at row 6, col 0 -> "A7+B7".
        let tokens = [
            0x24, 0x00, 0x00, 0x00, 0xC0, // RC
            0x24, 0x00, 0x00, 0x01, 0xC0, // R[0]C[1]
            0x03,
        ];
        let ctx = CellContext {
            target_row: 6,
            target_col: 0,
            base_row: 4,
            base_col: 0,
        };
        assert_eq!(decode_ptg(&tokens, Some(&ctx)), "A7+B7");
    }

    #[test]
    fn test_refn_negative_offsets() {
        // tRefN with row offset -1 (0x3FFF) and col offset -1 (0xFF),
        // both relative: the cell one up and one left of the target.
        let tokens = [0x2C, 0xFF, 0x3F, 0xFF, 0xC0];
        let ctx = CellContext::at(5, 3);
        assert_eq!(decode_ptg(&tokens, Some(&ctx)), a1(2, 4));
    }

    #[test]
    fn test_arean_offsets() {
        // tAreaN spanning the target row, cols +0..+2
        let tokens = [0x2D, 0x00, 0x00, 0x00, 0x00, 0x00, 0xC0, 0x02, 0xC0];
        let ctx = CellContext::at(0, 1);
        assert_eq!(decode_ptg(&tokens, Some(&ctx)), "B1:D1");
    }

    #[test]
    fn test_ref_err() {
        let tokens = [0x2A, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(decode_ptg(&tokens, None), "#REF!");
    }

    #[test]
    fn test_unknown_token_keeps_partial() {
        // tInt 1, tInt 2, tAdd, then an unknown token and trailing garbage
        let tokens = [0x1E, 0x01, 0x00, 0x1E, 0x02, 0x00, 0x03, 0x7E, 0xAA, 0xBB];
        assert_eq!(decode_ptg(&tokens, None), "1+2");
    }

    #[test]
    fn test_truncated_operand_keeps_partial() {
        // tInt 9 then a tNum with only 3 of 8 bytes
        let tokens = [0x1E, 0x09, 0x00, 0x1F, 0x01, 0x02, 0x03];
        assert_eq!(decode_ptg(&tokens, None), "9");
    }

    #[test]
    fn test_missing_arg() {
        // tInt 1, tMissArg, tFuncVar(argc=2, ROUND=27)
        let tokens = [0x1E, 0x01, 0x00, 0x16, 0x22, 0x02, 0x1B, 0x00];
        assert_eq!(decode_ptg(&tokens, None), "ROUND(1,)");
    }

    #[test]
    fn test_comparison_operators() {
        let tokens = [0x1E, 0x01, 0x00, 0x1E, 0x02, 0x00, 0x0E];
        assert_eq!(decode_ptg(&tokens, None), "1<>2");
        let tokens = [0x1E, 0x01, 0x00, 0x1E, 0x02, 0x00, 0x0A];
        assert_eq!(decode_ptg(&tokens, None), "1<=2");
    }

    #[test]
    fn test_decode_formula_adds_equals() {
        let tokens = [0x1E, 0x02, 0x00, 0x1E, 0x03, 0x00, 0x03];
        assert_eq!(decode_formula(&tokens, None).as_deref(), Some("=2+3"));
        assert_eq!(decode_formula(&[], None), None);
    }

    #[test]
    fn test_shared_formula_escape_detection() {
        assert!(is_shared_formula_ref(&[0x01, 0x00, 0x00]));
        assert!(!is_shared_formula_ref(&[0x1E, 0x01, 0x00]));
        assert!(!is_shared_formula_ref(&[]));
    }
}
