#[test]
fn osp_error_ui() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/osp_error_pass.rs");
}
