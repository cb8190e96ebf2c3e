use super::*;

fn int(value: i64) -> Expr {
    Expr::int(value, 1)
}

fn var(name: &str) -> Expr {
    Expr::ident(name, 1)
}

fn assign(name: &str, value: Expr) -> Statement {
    Statement::assign(var(name), value)
}

fn vector(items: Vec<Expr>) -> Expr {
    Expr::Vector(items)
}

fn matrix(rows: usize, cols: usize) -> Expr {
    vector(
        (0..rows)
            .map(|r| vector((0..cols).map(|c| int((r * cols + c) as i64)).collect()))
            .collect(),
    )
}

fn check(statements: Vec<Statement>) -> (Checker, Checked<TypeSymbol>) {
    let mut checker = Checker::default();
    let result = checker.check_program(&Program::new(statements));
    (checker, result)
}

fn type_of(checker: &Checker, name: &str) -> TypeDesc {
    checker
        .symbol(name)
        .and_then(|symbol| symbol.ty.clone())
        .expect("typed symbol")
}

fn expr_type(expr: Expr) -> Checked<TypeSymbol> {
    Checker::default().check_expr(&expr)
}

fn error_text(result: &Checked<TypeSymbol>) -> String {
    result
        .log()
        .errors()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn empty_program_is_accepted() {
    let (_, result) = check(Vec::new());
    assert!(result.is_ok());
    assert!(result.log().is_empty());
}

#[test]
fn first_assignment_fixes_the_type() {
    let (checker, result) = check(vec![
        assign("a", int(1)),
        assign("b", int(2)),
        assign("c", Expr::binary(BinaryOp::Add, var("a"), var("b"))),
        Statement::Print(vec![var("c")]),
    ]);
    assert!(result.is_ok(), "{}", error_text(&result));
    assert_eq!(type_of(&checker, "c"), TypeDesc::scalar(ElementType::Int));
}

#[test]
fn int_plus_float_is_float() {
    let (checker, result) = check(vec![
        assign("x", int(1)),
        assign("y", Expr::float(1.0, 1)),
        assign("z", Expr::binary(BinaryOp::Add, var("x"), var("y"))),
    ]);
    assert!(result.is_ok());
    assert_eq!(type_of(&checker, "z"), TypeDesc::scalar(ElementType::Float));
}

#[test]
fn reassignment_must_keep_type_and_shape() {
    let (_, same) = check(vec![assign("x", int(1)), assign("x", int(5))]);
    assert!(same.is_ok());

    let (checker, retyped) = check(vec![assign("x", int(1)), assign("x", Expr::float(2.5, 2))]);
    assert!(retyped.is_err());
    assert!(error_text(&retyped).contains("incompatible types"));
    assert_eq!(type_of(&checker, "x"), TypeDesc::scalar(ElementType::Int));

    let (_, reshaped) = check(vec![
        assign("v", vector(vec![int(1), int(2)])),
        assign("v", vector(vec![int(1), int(2), int(3)])),
    ]);
    assert!(reshaped.is_err());
}

#[test]
fn failed_right_hand_side_declares_nothing() {
    let (checker, result) = check(vec![assign(
        "x",
        Expr::binary(BinaryOp::Add, int(5), Expr::string("a", 1)),
    )]);
    assert!(result.is_err());
    assert!(checker.symbol("x").is_none());
}

#[test]
fn independent_errors_are_all_reported() {
    let (_, result) = check(vec![
        Statement::assign(
            Expr::ident("p", 1),
            Expr::binary(BinaryOp::Add, Expr::int(1, 1), Expr::string("a", 1)),
        ),
        Statement::assign(
            Expr::ident("q", 2),
            Expr::binary(
                BinaryOp::Add,
                Expr::int(1, 2),
                vector(vec![Expr::int(1, 2), Expr::int(2, 2)]),
            ),
        ),
    ]);
    assert!(result.is_err());
    let errors: Vec<_> = result.log().errors().collect();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].line, Some(1));
    assert!(errors[0].message.contains("wrong operator +"));
    assert_eq!(errors[1].line, Some(2));
    assert!(errors[1].message.contains("incompatible sizes"));
}

#[test]
fn unknown_symbol_is_reported() {
    let (_, result) = check(vec![Statement::Print(vec![Expr::ident("x", 7)])]);
    assert_eq!(error_text(&result), "7: TypeChecker: no such symbol as x");
}

#[test]
fn break_and_continue_need_a_loop() {
    let (_, outside) = check(vec![Statement::Break { line: 3 }, Statement::Continue { line: 4 }]);
    let text = error_text(&outside);
    assert!(text.contains("3: TypeChecker: break outside of a loop"));
    assert!(text.contains("4: TypeChecker: continue outside of a loop"));

    let (_, inside) = check(vec![Statement::for_range(
        Identifier::new("i", 1),
        int(0),
        int(3),
        Statement::block(vec![
            Statement::while_loop(
                Expr::relation(RelOp::Lt, int(0), int(1)),
                Statement::block(vec![Statement::Break { line: 2 }]),
            ),
            Statement::Continue { line: 3 },
        ]),
    )]);
    assert!(inside.is_ok(), "{}", error_text(&inside));
}

#[test]
fn loop_flag_is_restored_after_the_loop() {
    let (_, result) = check(vec![
        Statement::while_loop(
            Expr::relation(RelOp::Eq, int(1), int(1)),
            Statement::block(vec![Statement::Break { line: 1 }]),
        ),
        Statement::Break { line: 5 },
    ]);
    assert!(result.is_err());
    assert_eq!(result.log().errors().count(), 1);
}

#[test]
fn for_bounds_must_be_scalar_ints() {
    let body = || Statement::block(Vec::new());
    let (_, ok) = check(vec![Statement::for_range(
        Identifier::new("i", 1),
        int(4),
        int(5),
        body(),
    )]);
    assert!(ok.is_ok());

    let (_, float_start) = check(vec![Statement::for_range(
        Identifier::new("i", 1),
        Expr::float(4.0, 1),
        int(5),
        body(),
    )]);
    assert!(error_text(&float_start).contains("start of range"));

    let (_, vector_end) = check(vec![Statement::for_range(
        Identifier::new("i", 1),
        int(4),
        vector(vec![int(5)]),
        body(),
    )]);
    assert!(error_text(&vector_end).contains("end of range"));
}

#[test]
fn loop_variable_is_local_to_the_loop() {
    let (_, result) = check(vec![
        Statement::for_range(
            Identifier::new("i", 1),
            int(0),
            int(3),
            Statement::Print(vec![var("i")]),
        ),
        Statement::Print(vec![Expr::ident("i", 2)]),
    ]);
    assert_eq!(error_text(&result), "2: TypeChecker: no such symbol as i");
}

#[test]
fn block_bindings_do_not_leak() {
    let (checker, result) = check(vec![
        Statement::block(vec![assign("inner", int(1))]),
        Statement::Print(vec![Expr::ident("inner", 2)]),
    ]);
    assert!(result.is_err());
    assert!(checker.symbol("inner").is_none());
}

#[test]
fn conditions_must_be_scalar_bool() {
    let (_, numeric) = check(vec![Statement::if_then(
        Expr::binary(BinaryOp::Add, int(4), int(5)),
        Statement::block(Vec::new()),
    )]);
    assert!(error_text(&numeric).contains("condition must be a scalar bool"));

    let (_, elementwise) = check(vec![Statement::while_loop(
        Expr::relation(
            RelOp::Lt,
            vector(vec![int(1), int(2)]),
            vector(vec![int(3), int(4)]),
        ),
        Statement::block(Vec::new()),
    )]);
    assert!(elementwise.is_err());

    let (_, accepted) = check(vec![Statement::if_else(
        Expr::relation(RelOp::Eq, int(4), int(5)),
        Statement::block(Vec::new()),
        Statement::block(Vec::new()),
    )]);
    assert!(accepted.is_ok());
}

#[test]
fn operator_table_covers_strings_and_bools() {
    let concat = expr_type(Expr::binary(
        BinaryOp::Add,
        Expr::string("a", 1),
        Expr::string("b", 1),
    ));
    assert_eq!(
        concat.value().and_then(|s| s.ty.clone()),
        Some(TypeDesc::scalar(ElementType::String))
    );
    let repeat = expr_type(Expr::binary(BinaryOp::Mul, int(3), Expr::string("ab", 1)));
    assert!(repeat.is_ok());
    let minus = expr_type(Expr::binary(
        BinaryOp::Sub,
        Expr::string("a", 1),
        Expr::string("b", 1),
    ));
    assert!(minus.is_err());

    let equal = expr_type(Expr::relation(
        RelOp::Eq,
        Expr::string("a", 1),
        Expr::string("b", 1),
    ));
    assert!(equal.is_ok());
    let ordered = expr_type(Expr::relation(
        RelOp::Lt,
        Expr::string("a", 1),
        Expr::string("b", 1),
    ));
    assert!(ordered.is_err());
}

#[test]
fn relations_keep_operand_shape() {
    let result = expr_type(Expr::relation(RelOp::Le, matrix(2, 3), matrix(2, 3)));
    assert_eq!(
        result.value().and_then(|s| s.ty.clone()),
        Some(TypeDesc::new(ElementType::Bool, Shape::new(vec![2, 3])))
    );
}

#[test]
fn unary_minus_is_numeric_only() {
    assert!(expr_type(Expr::unary(UnaryOp::Neg, matrix(2, 2))).is_ok());
    assert!(expr_type(Expr::unary(UnaryOp::Neg, Expr::string("a", 1))).is_err());
}

#[test]
fn nested_literals_build_rank() {
    let result = expr_type(vector(vec![matrix(2, 3), matrix(2, 3)]));
    assert_eq!(
        result.value().and_then(|s| s.ty.clone()),
        Some(TypeDesc::new(ElementType::Int, Shape::new(vec![2, 2, 3])))
    );

    let empty = expr_type(vector(Vec::new()));
    assert_eq!(
        empty.value().and_then(|s| s.ty.clone()),
        Some(TypeDesc::new(ElementType::Int, Shape::new(vec![0])))
    );

    let ragged = expr_type(vector(vec![vector(vec![int(1)]), vector(vec![int(1), int(2)])]));
    assert!(error_text(&ragged).contains("wrong size of elements"));

    let mixed = expr_type(vector(vec![int(1), Expr::float(2.0, 1)]));
    assert!(error_text(&mixed).contains("wrong type of elements"));
}

#[test]
fn special_matrices_take_literal_sizes() {
    let zeros = expr_type(Expr::Zeros(vec![int(2), int(3)]));
    assert_eq!(
        zeros.value().and_then(|s| s.ty.clone()),
        Some(TypeDesc::new(ElementType::Int, Shape::new(vec![2, 3])))
    );
    let empty = expr_type(Expr::Ones(vec![int(0)]));
    assert_eq!(
        empty.value().and_then(|s| s.ty.clone()),
        Some(TypeDesc::new(ElementType::Int, Shape::new(vec![0])))
    );
    assert!(expr_type(Expr::Zeros(Vec::new())).is_err());
    assert!(expr_type(Expr::Ones(vec![Expr::float(2.0, 1)])).is_err());

    let (_, computed) = check(vec![
        assign("n", int(2)),
        Statement::assign(var("z"), Expr::Zeros(vec![var("n")])),
    ]);
    assert!(error_text(&computed).contains("non-negative integer literals"));

    let eye = expr_type(Expr::eye(int(3)));
    assert_eq!(
        eye.value().and_then(|s| s.ty.clone()),
        Some(TypeDesc::new(ElementType::Int, Shape::new(vec![3, 3])))
    );
    assert!(expr_type(Expr::eye(vector(vec![int(3)]))).is_err());
}

#[test]
fn literal_indices_are_bounds_checked() {
    let setup = || assign("m", matrix(2, 3));
    let (_, row) = check(vec![
        setup(),
        assign("r", Expr::index(var("m"), vec![int(1)])),
    ]);
    assert!(row.is_ok());

    let (checker, element) = check(vec![
        setup(),
        assign("e", Expr::index(var("m"), vec![int(1), int(2)])),
    ]);
    assert!(element.is_ok());
    assert_eq!(type_of(&checker, "e"), TypeDesc::scalar(ElementType::Int));

    let (_, outside) = check(vec![
        setup(),
        assign("e", Expr::index(var("m"), vec![int(0), int(3)])),
    ]);
    assert!(error_text(&outside).contains("outside of the vector"));

    let (_, too_deep) = check(vec![
        setup(),
        assign("e", Expr::index(var("m"), vec![int(0), int(0), int(0)])),
    ]);
    assert!(error_text(&too_deep).contains("larger than dim"));

    let (_, float_index) = check(vec![
        setup(),
        assign("e", Expr::index(var("m"), vec![Expr::float(0.0, 1)])),
    ]);
    assert!(error_text(&float_index).contains("scalar ints"));
}

#[test]
fn variable_indices_depend_on_options() {
    let program = Program::new(vec![
        assign("v", vector(vec![int(1), int(2), int(3)])),
        Statement::for_range(
            Identifier::new("i", 2),
            int(0),
            int(3),
            Statement::Print(vec![Expr::index(var("v"), vec![Expr::ident("i", 2)])]),
        ),
    ]);
    assert!(check_program(&program).is_ok());

    let strict = CheckOptions {
        literal_indices_only: true,
        ..CheckOptions::default()
    };
    let result = check_program_with_options(&program, &strict);
    assert!(error_text(&result).contains("integer literals"));
}

#[test]
fn indexed_assignment_matches_element_type() {
    let (_, ok) = check(vec![
        Statement::assign(var("x"), Expr::Zeros(vec![int(2), int(2)])),
        Statement::assign(Expr::index(var("x"), vec![int(0), int(0)]), int(1)),
    ]);
    assert!(ok.is_ok(), "{}", error_text(&ok));

    let (_, row) = check(vec![
        Statement::assign(var("x"), Expr::Zeros(vec![int(2), int(2)])),
        Statement::assign(
            Expr::index(var("x"), vec![int(1)]),
            vector(vec![int(5), int(6)]),
        ),
    ]);
    assert!(row.is_ok());

    let (_, wrong) = check(vec![
        Statement::assign(var("x"), Expr::Zeros(vec![int(2), int(2)])),
        Statement::assign(
            Expr::index(var("x"), vec![int(0), int(0)]),
            Expr::string("s", 1),
        ),
    ]);
    assert!(error_text(&wrong).contains("incompatible types"));

    let (checker, undeclared) = check(vec![Statement::assign(
        Expr::index(var("y"), vec![int(0)]),
        int(1),
    )]);
    assert!(undeclared.is_err());
    assert!(checker.symbol("y").is_none());
}

#[test]
fn matmul_contracts_inner_dimension() {
    let product = expr_type(Expr::matmul(matrix(2, 3), matrix(3, 4)));
    assert_eq!(
        product.value().and_then(|s| s.ty.clone()),
        Some(TypeDesc::new(ElementType::Int, Shape::new(vec![2, 4])))
    );
    let dot = expr_type(Expr::matmul(
        vector(vec![int(1), int(2)]),
        vector(vec![Expr::float(1.0, 1), Expr::float(2.0, 1)]),
    ));
    assert_eq!(
        dot.value().and_then(|s| s.ty.clone()),
        Some(TypeDesc::scalar(ElementType::Float))
    );
    let mismatch = expr_type(Expr::matmul(matrix(2, 3), matrix(2, 3)));
    assert!(error_text(&mismatch).contains("incompatible sizes"));
    assert!(expr_type(Expr::matmul(int(2), matrix(1, 1))).is_err());
}

#[test]
fn transpose_reverses_axes() {
    let result = expr_type(Expr::transpose(matrix(2, 3)));
    assert_eq!(
        result.value().and_then(|s| s.ty.clone()),
        Some(TypeDesc::new(ElementType::Int, Shape::new(vec![3, 2])))
    );
    assert!(expr_type(Expr::transpose(int(1))).is_err());
}

#[test]
fn print_and_return_check_every_expression() {
    let (_, result) = check(vec![Statement::Return(vec![
        Expr::ident("a", 1),
        int(1),
        Expr::ident("b", 2),
    ])]);
    assert_eq!(result.log().errors().count(), 2);
}

#[test]
fn trace_mode_logs_without_failing() {
    let options = CheckOptions {
        trace: true,
        ..CheckOptions::default()
    };
    let program = Program::new(vec![assign("a", int(1))]);
    let result = check_program_with_options(&program, &options);
    assert!(result.is_ok());
    assert!(!result.log().is_empty());
    assert_eq!(result.log().errors().count(), 0);
}
