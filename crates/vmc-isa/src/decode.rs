//! MIPS word decoder.

use crate::encode::*;
use crate::instruction::Operands;

/// A decoded 32-bit word: opcode plus form-specific operand fields.
///
/// Addresses, mnemonics and line numbers come from the surrounding
/// listing, not the word itself; the parser attaches them when it builds
/// an [`Instruction`](crate::Instruction).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedWord {
    /// Primary opcode (bits [31:26]).
    pub opcode: u8,
    /// Form-specific operand fields.
    pub operands: Operands,
}

/// Decode a 32-bit MIPS word.
///
/// Opcodes 0x00 (SPECIAL) and 0x1C (SPECIAL2) decode as R-form, 0x02/0x03
/// (j/jal) as J-form, everything else as I-form with a sign-extended
/// 16-bit immediate.
#[must_use]
pub fn decode(word: u32) -> DecodedWord {
    let opcode = decode_opcode(word);

    let operands = match opcode {
        0x00 | 0x1C => Operands::R {
            rs: decode_rs(word),
            rt: decode_rt(word),
            rd: decode_rd(word),
            shamt: decode_shamt(word),
            funct: decode_funct(word),
        },
        0x02 | 0x03 => Operands::J {
            target: decode_j_target(word),
        },
        _ => Operands::I {
            rs: decode_rs(word),
            rt: decode_rt(word),
            imm: decode_imm(word),
        },
    };

    DecodedWord { opcode, operands }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{encode_i, encode_j, encode_r};

    #[test]
    fn test_decode_r_form() {
        // sltu at,at,sp -> 00 3d 08 2b
        let word = 0x003D_082B;
        let decoded = decode(word);
        assert_eq!(decoded.opcode, 0x00);
        assert_eq!(
            decoded.operands,
            Operands::R {
                rs: 1,
                rt: 29,
                rd: 1,
                shamt: 0,
                funct: 0x2B
            }
        );
    }

    #[test]
    fn test_decode_i_form_sign_extends() {
        // daddi sp,sp,-88 -> 63 bd ff a8
        let word = 0x63BD_FFA8;
        let decoded = decode(word);
        assert_eq!(decoded.opcode, 0x18);
        assert_eq!(
            decoded.operands,
            Operands::I {
                rs: 29,
                rt: 29,
                imm: -88
            }
        );
    }

    #[test]
    fn test_decode_j_form_target() {
        // jal 0x12398 -> 0c 00 48 e6
        let word = 0x0C00_48E6;
        let decoded = decode(word);
        assert_eq!(decoded.opcode, 0x03);
        assert_eq!(decoded.operands, Operands::J { target: 0x12398 });
    }

    #[test]
    fn test_special2_is_r_form() {
        let word = encode_r(0x1C, 4, 5, 6, 0, 0x02);
        let decoded = decode(word);
        assert!(matches!(decoded.operands, Operands::R { funct: 0x02, .. }));
    }

    #[test]
    fn test_r_round_trip() {
        for &(rs, rt, rd, shamt, funct) in &[(0, 0, 0, 0, 0x0C), (1, 29, 1, 0, 0x2B), (31, 31, 31, 31, 0x3F)] {
            let word = encode_r(0x00, rs, rt, rd, shamt, funct);
            let decoded = decode(word);
            assert_eq!(
                decoded.operands,
                Operands::R { rs, rt, rd, shamt, funct },
                "word {word:#010x}"
            );
            if let Operands::R { rs, rt, rd, shamt, funct } = decoded.operands {
                assert_eq!(encode_r(decoded.opcode, rs, rt, rd, shamt, funct), word);
            }
        }
    }

    #[test]
    fn test_i_round_trip() {
        for &(opcode, rs, rt, imm) in &[(0x19u8, 0u8, 2u8, 5000i16), (0x08, 29, 29, -88), (0x23, 29, 4, 8)] {
            let word = encode_i(opcode, rs, rt, imm);
            let decoded = decode(word);
            assert_eq!(
                decoded.operands,
                Operands::I { rs, rt, imm: imm as i64 },
                "word {word:#010x}"
            );
            assert_eq!(encode_i(decoded.opcode, rs, rt, imm), word);
        }
    }

    #[test]
    fn test_j_round_trip() {
        for &target in &[0x0u64, 0x12398, 0x0FFF_FFFC] {
            let word = encode_j(0x02, target);
            let decoded = decode(word);
            assert_eq!(decoded.operands, Operands::J { target });
            assert_eq!(encode_j(decoded.opcode, target), word);
        }
    }
}
