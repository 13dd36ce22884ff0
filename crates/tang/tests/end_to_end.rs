//! End-to-end scenarios: a script compiled and run start to finish, checked against
//! its accumulated output and the stringified `context.result`.

use tang::{Language, Program, ProgramFlags};

fn run(source: &str) -> (String, String, bool) {
    let language = Language::with_builtins();
    let program = Program::create(&language, source, ProgramFlags::default()).expect("program should compile");
    let mut ctx = program.create_context();
    program.execute(&mut ctx);
    let result = ctx.result.to_display_string(&ctx.gc);
    (result, ctx.output.clone(), ctx.result.is_error())
}

#[test]
fn arithmetic_precedence() {
    let (result, ..) = run("3 + 4 * 2;");
    assert_eq!(result, "11");
}

#[test]
fn reassignment() {
    let (result, ..) = run("a = 5; a = a + 1; a;");
    assert_eq!(result, "6");
}

#[test]
fn if_else_picks_the_true_branch() {
    let (result, ..) = run(r#"if (1 < 2) { "yes"; } else { "no"; }"#);
    assert_eq!(result, "yes");
}

#[test]
fn while_loop_counts_to_three() {
    let (result, ..) = run("i = 0; while (i < 3) { i = i + 1; } i;");
    assert_eq!(result, "3");
}

#[test]
fn math_pi_is_reachable_through_use() {
    let (result, ..) = run("use math; math.pi;");
    assert_eq!(result, "3.141593");
}

#[test]
fn print_accumulates_output_while_result_stays_null() {
    let (result, output, _) = run(r#"print("hi"); null;"#);
    assert_eq!(output, "hi");
    assert_eq!(result, "null");
}

#[test]
fn seeded_rng_matches_the_mersenne_twister_stream_directly() {
    let (result, ..) = run("use random; random.seeded(123).next_int;");

    // The same seed run through the standalone generator must produce the same
    // first draw the library-bound Rng produces.
    let mut reference = tang_reference_mt19937_64(123);
    let expected = reference.next_u64() as i64;
    assert_eq!(result, expected.to_string());
}

#[test]
fn divide_by_zero_is_an_error_value_not_a_panic() {
    let (result, _, is_error) = run("10 / 0;");
    assert!(is_error);
    assert!(result.starts_with("Error:"));
}

/// A from-scratch MT19937-64 used only to double-check the library's seeded stream
/// in [`seeded_rng_matches_the_mersenne_twister_stream_directly`] without reaching
/// into the crate's private `library::random` module.
struct ReferenceMt19937_64 {
    state: [u64; 312],
    index: usize,
}

fn tang_reference_mt19937_64(seed: u64) -> ReferenceMt19937_64 {
    let mut state = [0u64; 312];
    state[0] = seed;
    for i in 1..312 {
        state[i] = 6364136223846793005u64
            .wrapping_mul(state[i - 1] ^ (state[i - 1] >> 62))
            .wrapping_add(i as u64);
    }
    ReferenceMt19937_64 { state, index: 312 }
}

impl ReferenceMt19937_64 {
    fn next_u64(&mut self) -> u64 {
        const MATRIX_A: u64 = 0xB502_6F5A_A966_19E9;
        const UPPER_MASK: u64 = 0xFFFF_FFFF_8000_0000;
        const LOWER_MASK: u64 = 0x7FFF_FFFF;
        const MAG01: [u64; 2] = [0, MATRIX_A];

        if self.index >= 312 {
            for i in 0..312 {
                let x = (self.state[i] & UPPER_MASK) | (self.state[(i + 1) % 312] & LOWER_MASK);
                self.state[i] = self.state[(i + 156) % 312] ^ (x >> 1) ^ MAG01[(x & 1) as usize];
            }
            self.index = 0;
        }
        let mut y = self.state[self.index];
        self.index += 1;
        y ^= (y >> 29) & 0x5555_5555_5555_5555;
        y ^= (y << 17) & 0x71D6_7FFF_EDA6_0000;
        y ^= (y << 37) & 0xFFF7_EEE0_0000_0000;
        y ^= y >> 43;
        y
    }
}
