//! # Parser Tests

use msisim::common::LoadError;
use msisim::isa::{AluOp, BranchCond, Instruction, Opcode, Operand, parse_line, parse_program};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn one(line: &str) -> Instruction {
    parse_line(line, 1).unwrap().unwrap()
}

#[test]
fn test_register_and_immediate_forms() {
    assert_eq!(
        one("add $2, $3, $4"),
        Instruction::alu(AluOp::Add, 2, 3, Operand::Reg(4))
    );
    assert_eq!(
        one("sub $r2 $R3 -12"),
        Instruction::alu(AluOp::Sub, 2, 3, Operand::Imm(-12))
    );
    assert_eq!(
        one("  SRA $5,$6,0x1f ; shift"),
        Instruction::alu(AluOp::Sra, 5, 6, Operand::Imm(31))
    );
}

#[test]
fn test_memory_addressing_forms() {
    let expected = Instruction::load(false, 2, 3, Operand::Imm(8));
    assert_eq!(one("lw $2, $3, 8"), expected);
    assert_eq!(one("lw $2, 8($3)"), expected);
    assert_eq!(
        one("ll $2, $4($3)"),
        Instruction::load(true, 2, 3, Operand::Reg(4))
    );
    assert_eq!(
        one("sw $7, ($3)"),
        Instruction::store(false, 7, 3, Operand::Imm(0))
    );
    assert_eq!(
        one("sc $7, -4($3)"),
        Instruction::store(true, 7, 3, Operand::Imm(-4))
    );
}

#[test]
fn test_control_flow_forms() {
    assert_eq!(one("bge $2, $3, 7"), Instruction::branch(BranchCond::Ge, 2, 3, 7));
    assert_eq!(one("jal 3"), Instruction::jal(3));
    assert_eq!(one("jal $15, 3"), Instruction::jal(3));
    assert_eq!(one("halt"), Instruction::halt());
}

#[test]
fn test_blank_and_comment_lines_skipped() {
    assert_eq!(parse_line("", 1), Ok(None));
    assert_eq!(parse_line("   ; nothing here", 2), Ok(None));

    let program = parse_program("; header\n\nadd $2, $0, 1\n  \nhalt ; done\n").unwrap();
    assert_eq!(program.len(), 2);
    assert_eq!(program[1].op, Opcode::Halt);
}

#[test]
fn test_sw_may_read_reserved_register() {
    assert_eq!(
        one("sw $1, 0($0)"),
        Instruction::store(false, 1, 0, Operand::Imm(0))
    );
}

#[rstest]
#[case("foo $1, $2, $3", "UnknownOpcode")]
#[case("add $2, $3", "OperandCount")]
#[case("halt $2", "OperandCount")]
#[case("add 2, $3, $4", "BadRegister")]
#[case("add $x, $3, $4", "BadRegister")]
#[case("add $16, $3, $4", "RegisterOutOfRange")]
#[case("add $1, $3, $4", "ReservedDestination")]
#[case("lw $1, 0($0)", "ReservedDestination")]
#[case("sc $1, 0($0)", "ReservedDestination")]
#[case("add $2, $3, 2048", "ImmediateOutOfRange")]
#[case("add $2, $3, -2049", "ImmediateOutOfRange")]
#[case("add $2, $3, 12q", "MalformedImmediate")]
#[case("lw $2, 4[$3]", "MalformedImmediate")]
fn test_line_errors(#[case] line: &str, #[case] kind: &str) {
    let err = parse_line(line, 9).unwrap_err();
    let debug = format!("{err:?}");
    assert!(debug.starts_with(kind), "{line}: got {debug}");
    assert!(err.to_string().starts_with("line 9"), "{err}");
}

#[test]
fn test_branch_target_outside_program() {
    let err = parse_program("add $2, $0, 1\nbeq $0, $0, 2\n").unwrap_err();
    assert_eq!(
        err,
        LoadError::TargetOutOfRange {
            line: 2,
            target: 2,
            len: 2
        }
    );
    assert!(parse_program("jal -1\nhalt\n").is_err());
    assert!(parse_program("jal 1\nhalt\n").is_ok());
}

#[test]
fn test_program_length_limit() {
    let text = "add $2, $0, 1\n".repeat(1025);
    assert!(matches!(
        parse_program(&text),
        Err(LoadError::ProgramTooLong { len: 1025, max: 1024 })
    ));
}

#[test]
fn test_dest_and_sources() {
    let sc = one("sc $7, 4($3)");
    assert_eq!(sc.dest(), Some(7));
    assert_eq!(sc.sources(), [Some(3), None, Some(7)]);

    let sw = one("sw $7, $2($3)");
    assert_eq!(sw.dest(), None);
    assert_eq!(sw.sources(), [Some(3), Some(2), Some(7)]);

    assert_eq!(one("jal 0").dest(), Some(15));
    assert_eq!(one("beq $2, $3, 0").dest(), None);
}
