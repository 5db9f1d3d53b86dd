use std::collections::BTreeSet;

use blockmul_codegen::{
    generate, DecompFunction, Instruction, Listing, Renderer, RustStatements, Scratch,
};
use blockmul_factorization::Factorization;
use blockmul_number::{Coefficient, Gf2};
use pretty_assertions::assert_eq;
use test_log::test;

const STRASSEN_GF2: &str = "\
tmp_mk.set_to_sum_unchecked(&a_blks[0][0], &a_blks[1][1]);
tmp_kn.set_to_sum_unchecked(&b_blks[0][0], &b_blks[1][1]);
addmul_recurse(&mut tmp_mn, &tmp_mk, &tmp_kn, &algos);
c_blks[0][0].add_unchecked(&tmp_mn);
c_blks[1][1].add_unchecked(&tmp_mn);
tmp_mk.set_to_sum_unchecked(&a_blks[1][0], &a_blks[1][1]);
tmp_kn.clear();
tmp_kn.add_unchecked(&b_blks[0][0]);
tmp_mn.clear();
addmul_recurse(&mut tmp_mn, &tmp_mk, &tmp_kn, &algos);
c_blks[1][0].add_unchecked(&tmp_mn);
c_blks[1][1].add_unchecked(&tmp_mn);
tmp_mk.clear();
tmp_mk.add_unchecked(&a_blks[0][0]);
tmp_kn.set_to_sum_unchecked(&b_blks[0][1], &b_blks[1][1]);
tmp_mn.clear();
addmul_recurse(&mut tmp_mn, &tmp_mk, &tmp_kn, &algos);
c_blks[0][1].add_unchecked(&tmp_mn);
c_blks[1][1].add_unchecked(&tmp_mn);
tmp_mk.clear();
tmp_mk.add_unchecked(&a_blks[1][1]);
tmp_kn.set_to_sum_unchecked(&b_blks[0][0], &b_blks[1][0]);
tmp_mn.clear();
addmul_recurse(&mut tmp_mn, &tmp_mk, &tmp_kn, &algos);
c_blks[0][0].add_unchecked(&tmp_mn);
c_blks[1][0].add_unchecked(&tmp_mn);
tmp_mk.set_to_sum_unchecked(&a_blks[0][0], &a_blks[0][1]);
tmp_kn.clear();
tmp_kn.add_unchecked(&b_blks[1][1]);
tmp_mn.clear();
addmul_recurse(&mut tmp_mn, &tmp_mk, &tmp_kn, &algos);
c_blks[0][0].add_unchecked(&tmp_mn);
c_blks[0][1].add_unchecked(&tmp_mn);
tmp_mk.set_to_sum_unchecked(&a_blks[0][0], &a_blks[1][0]);
tmp_kn.set_to_sum_unchecked(&b_blks[0][0], &b_blks[0][1]);
tmp_mn.clear();
addmul_recurse(&mut tmp_mn, &tmp_mk, &tmp_kn, &algos);
c_blks[1][1].add_unchecked(&tmp_mn);
tmp_mk.set_to_sum_unchecked(&a_blks[0][1], &a_blks[1][1]);
tmp_kn.set_to_sum_unchecked(&b_blks[1][0], &b_blks[1][1]);
tmp_mn.clear();
addmul_recurse(&mut tmp_mn, &tmp_mk, &tmp_kn, &algos);
c_blks[0][0].add_unchecked(&tmp_mn);
";

#[test]
fn strassen_over_gf2() {
    let program = generate(&Factorization::<Gf2>::strassen());
    assert_eq!(program.instructions().len(), 43);
    assert_eq!(RustStatements.render(&program), STRASSEN_GF2);
}

#[test]
fn strassen_over_integers_keeps_signs() {
    let code = RustStatements.render(&generate(&Factorization::<i64>::strassen()));
    let lines = code.lines().collect::<Vec<_>>();
    assert!(lines.contains(&"c_blks[1][1].add_scaled_unchecked(&tmp_mn, -1);"));
    assert!(lines.contains(
        &"tmp_kn.set_to_combination_unchecked(&b_blks[0][0], -1, &b_blks[1][0], 1);"
    ));
    assert!(lines.contains(&"c_blks[0][0].add_scaled_unchecked(&tmp_mn, -1);"));
}

#[test]
fn generation_is_deterministic() {
    let f = Factorization::<Gf2>::naive(3);
    assert_eq!(
        RustStatements.render(&generate(&f)),
        RustStatements.render(&generate(&f))
    );
}

fn check_structure<T: Coefficient>(f: &Factorization<T>) {
    let program = generate(f);
    assert_eq!(program.n(), f.n());
    assert_eq!(program.multiplication_count(), f.rank());
    program.validate().unwrap();

    // Every product is followed by exactly the output updates its third
    // factor selects.
    let outputs = program
        .instructions()
        .iter()
        .filter(|i| matches!(i, Instruction::AccumulateIntoOutput { .. }))
        .count();
    let expected = (0..f.rank())
        .map(|alpha| f.w().nonzero_in_slice(alpha).count())
        .sum::<usize>();
    assert_eq!(outputs, expected);

    let all_blocks = (0..f.n())
        .flat_map(|i| (0..f.n()).map(move |k| (i, k)))
        .collect::<BTreeSet<_>>();
    assert_eq!(program.written_outputs(), all_blocks);
}

#[test]
fn structure_of_known_factorizations() {
    check_structure(&Factorization::<Gf2>::strassen());
    check_structure(&Factorization::<i64>::strassen());
    for n in 1..=3 {
        check_structure(&Factorization::<Gf2>::naive(n));
    }
}

#[test]
fn blocks_without_third_factor_terms_are_not_written() {
    // Only C[0][0] = A[0][0] B[0][0] + A[0][1] B[1][0], plus a product that
    // feeds no output at all.
    let f = Factorization::<i64>::from_terms(
        2,
        &[
            (&[(0, 0, 1)], &[(0, 0, 1)], &[(0, 0, 1)]),
            (&[(0, 1, 1)], &[(1, 0, 1)], &[(0, 0, 1)]),
            (&[(1, 1, 1)], &[(1, 1, 1)], &[]),
        ],
    )
    .unwrap();
    let program = generate(&f);
    program.validate().unwrap();
    assert_eq!(program.multiplication_count(), 3);
    assert_eq!(program.written_outputs(), BTreeSet::from([(0, 0)]));
    let last = program.instructions().last().unwrap();
    assert!(matches!(last, Instruction::MultiplyAccumulate { .. }), "{last}");
}

#[test]
fn naive_three_by_three_has_27_products() {
    let program = generate(&Factorization::<i64>::naive(3));
    assert_eq!(program.multiplication_count(), 27);
    // All operands are single blocks, so after the first product each one
    // is cleared before its block is added.
    let clears = program
        .instructions()
        .iter()
        .filter(|i| matches!(i, Instruction::Clear { .. }))
        .count();
    assert_eq!(clears, 26 * 3);
}

#[test]
fn program_serializes_to_json() {
    let program = generate(&Factorization::<i64>::naive(1));
    let json = serde_json::to_value(&program).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "n": 1,
            "rank": 1,
            "instructions": [
                {"op": "accumulate", "dst": "mk", "term": {"operand": "A", "row": 0, "col": 0, "coeff": 1}},
                {"op": "accumulate", "dst": "kn", "term": {"operand": "B", "row": 0, "col": 0, "coeff": 1}},
                {"op": "multiply_accumulate", "dst": "mn", "lhs": "mk", "rhs": "kn"},
                {"op": "accumulate_into_output", "row": 0, "col": 0, "src": "mn", "coeff": 1},
            ]
        })
    );
}

#[test]
fn listing_and_wrapped_function() {
    let program = generate(&Factorization::<Gf2>::strassen());
    let listing = Listing.render(&program);
    assert!(listing.starts_with("tmp_mk = A[0][0] + A[1][1]\n"));
    assert_eq!(listing.lines().count(), 43);
    assert!(listing.contains("tmp_mn += tmp_mk * tmp_kn"));

    let wrapped = DecompFunction {
        name: "addmul_strassen".to_string(),
    }
    .render(&program);
    assert!(wrapped.starts_with("// Rank-7 algorithm for 2x2 block matrices.\n"));
    assert!(wrapped.contains("decomp_fn!(addmul_strassen, 2, |a_blks"));
    for line in STRASSEN_GF2.lines() {
        assert!(wrapped.contains(&format!("    {line}\n")), "{line}");
    }
    assert!(wrapped.ends_with("});\n"));
    assert!(program
        .instructions()
        .iter()
        .any(|i| matches!(i, Instruction::Clear { scratch: Scratch::Mn })));
}
