//! Per-instruction cycle estimates, following the published 8086 timing table.
//!
//! Estimates only depend on the instruction form. Conditional jumps and loops are
//! not charged. Estimates never influence execution.

use crate::decoder::{Direction, Encoding, InstrKind, Instruction};
use crate::operand::EffectiveAddress;
use crate::symbol::EffectiveBase;

/// Cycles spent computing the effective address of a memory operand.
pub fn effective_address(ea: &EffectiveAddress) -> u32 {
    use EffectiveBase::*;
    let Some(base) = ea.base else {
        // Direct address
        return 6;
    };
    let (plain, displaced) = match base {
        BxSi | BpDi => (7, 11),
        BxDi | BpSi => (8, 12),
        Si | Di | Bp | Bx => (5, 9),
    };
    if ea.disp != 0 {
        displaced
    } else {
        plain
    }
}

/// Cycles taken by `instr`.
pub fn estimate(instr: &Instruction) -> u32 {
    let ea = instr.memory_operand().map(effective_address);
    match (instr.kind, instr.encoding) {
        (InstrKind::Jump(_) | InstrKind::Loop(_), _) => 0,
        (_, Encoding::ImmReg | Encoding::ImmAcc) => 4,
        (InstrKind::Mov, Encoding::AccMem) => 10,
        (InstrKind::Mov, Encoding::RegMem) => match (ea, instr.direction) {
            (None, _) => 2,
            (Some(ea), Direction::FromReg) => 9 + ea,
            (Some(ea), Direction::ToReg) => 8 + ea,
        },
        (InstrKind::Mov, Encoding::ImmRegMem) => ea.map_or(4, |ea| 10 + ea),
        (InstrKind::Arith(_), Encoding::RegMem) => match (ea, instr.direction) {
            (None, _) => 3,
            (Some(ea), Direction::FromReg) => 16 + ea,
            (Some(ea), Direction::ToReg) => 9 + ea,
        },
        (InstrKind::Arith(_), Encoding::ImmRegMem) => ea.map_or(4, |ea| 17 + ea),
        (kind, encoding) => unreachable!("decoder produced {kind:?} with {encoding:?}"),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::decoder::decode;

    fn cost(bytes: &[u8]) -> u32 {
        estimate(&decode(bytes, 0).unwrap())
    }

    #[test]
    fn effective_address_costs() {
        #[rustfmt::skip]
        let cases = [
            // (r/m, without displacement, with displacement)
            (0, 7, 11),
            (1, 8, 12),
            (2, 8, 12),
            (3, 7, 11),
            (4, 5, 9),
            (5, 5, 9),
            (6, 5, 9),
            (7, 5, 9),
        ];
        for (rm, plain, displaced) in cases {
            let base = Some(EffectiveBase::from_field(rm));
            assert_eq!(effective_address(&EffectiveAddress { base, disp: 0 }), plain);
            assert_eq!(effective_address(&EffectiveAddress { base, disp: 4 }), displaced);
            assert_eq!(effective_address(&EffectiveAddress { base, disp: -4 }), displaced);
        }
        assert_eq!(effective_address(&EffectiveAddress::direct(1000)), 6);
    }

    #[test]
    fn mov_costs() {
        // mov cx, bx
        assert_eq!(cost(&[0x89, 0xd9]), 2);
        // mov [bp + di], cx
        assert_eq!(cost(&[0x89, 0x0b]), 9 + 7);
        // mov cx, [bx + 4]
        assert_eq!(cost(&[0x8b, 0x4f, 0x04]), 8 + 9);
        // mov dx, [1000]
        assert_eq!(cost(&[0x8b, 0x16, 0xe8, 0x03]), 8 + 6);
        // mov word [bx + di + 2], 5
        assert_eq!(cost(&[0xc7, 0x41, 0x02, 0x05, 0x00]), 10 + 12);
        // mov bx, 5 (via the r/m form)
        assert_eq!(cost(&[0xc7, 0xc3, 0x05, 0x00]), 4);
        // mov ax, 1
        assert_eq!(cost(&[0xb8, 0x01, 0x00]), 4);
        // mov ax, [16]
        assert_eq!(cost(&[0xa1, 0x10, 0x00]), 10);
    }

    #[test]
    fn arithmetic_costs() {
        // add bx, cx
        assert_eq!(cost(&[0x01, 0xcb]), 3);
        // add [bx + si], cx
        assert_eq!(cost(&[0x01, 0x08]), 16 + 7);
        // sub cx, [bp + si - 1]
        assert_eq!(cost(&[0x2b, 0x4a, 0xff]), 9 + 12);
        // add word [bp + 2], 5
        assert_eq!(cost(&[0x83, 0x46, 0x02, 0x05]), 17 + 9);
        // cmp si, 2
        assert_eq!(cost(&[0x83, 0xfe, 0x02]), 4);
        // add ax, 10
        assert_eq!(cost(&[0x05, 0x0a, 0x00]), 4);
        // xor bx, cx
        assert_eq!(cost(&[0x31, 0xcb]), 3);
    }

    #[test]
    fn branches_are_free() {
        // jne -4; je -4
        assert_eq!(cost(&[0x75, 0xfc]), 0);
        assert_eq!(cost(&[0x74, 0xfc]), 0);
        // loopnz, loopz, loop, jcxz
        for op in 0xe0..=0xe3 {
            assert_eq!(cost(&[op, 0xfe]), 0);
        }
    }
}
