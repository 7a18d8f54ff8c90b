//! Random test data for form-fill scenarios.
//!
//! Every value comes from a seeded xorshift64 stream, so a failing scenario
//! can be replayed exactly by logging the seed and constructing the
//! generator again with it.
//!
//! # Example
//!
//! ```
//! use pomkit::test_data::{Seed, TestDataGenerator};
//!
//! let mut gen = TestDataGenerator::new(Seed::from_u64(7));
//! let feedback = gen.feedback_message();
//! assert!(feedback.starts_with("Feedback: "));
//! assert!(feedback.ends_with(" #auto"));
//! ```

use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

const FEEDBACK_WORDS: &[&str] = &[
    "system", "feature", "module", "issue", "feedback", "response", "support", "user",
    "application", "working", "problem", "testing", "validation", "performance", "screen",
    "button", "dropdown", "form", "message", "error", "success", "option", "input", "field",
    "data", "random", "selection", "page", "action", "request",
];

/// Designations offered during onboarding
pub const DESIGNATIONS: &[&str] = &[
    "Chief Financial Officer (CFO)",
    "Finance Manager / Controller",
    "Accounts Executive / Accountant",
    "Company Secretary (CS)",
    "Compliance Officer",
    "HR Manager / HR Team",
    "Payroll Manager",
    "Tax Consultant / CA",
    "Legal Advisor / Legal Team",
    "Operations Manager",
    "Business Owner / Founder / CEO",
    "IT Administrator",
    "Office Manager / Admin",
    "External Auditor",
    "Others",
];

/// Business types offered on the welcome page
pub const BUSINESS_TYPES: &[&str] = &[
    "Private limited company(PVT)",
    "Limited liability partnership(LLP)",
    "One person company(OPC)",
    "Sole proprietorship",
    "Partnership firm",
    "Nidhi Company",
    "Section 8 Company",
    "Trust Registration",
    "Foreign Company",
    "Public limited",
    "Non Banking Financial Company(NBFC)",
    "Producer Company",
    "Society Company",
];

/// Team size buckets
pub const EMPLOYEE_COUNTS: &[&str] = &[
    "No employees",
    "1 - 10",
    "11 - 20",
    "21 - 50",
    "51 - 100",
    "100+",
];

/// Annual turnover buckets
pub const TURNOVERS: &[&str] = &[
    "0 - 10 Lakhs",
    "10 - 20 Lakhs",
    "20 Lakhs - 40 Lakhs",
    "40 Lakhs - 1 CR",
    "1 CR - 2 CR",
    "2 CR - 5 CR",
    "5 CR - 10 CR",
    "10 CR - 20 CR",
    "20 CR - 100 CR",
    "100 CR - 500 CR",
    "500 CR+",
];

const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";
/// Characters accepted as "special" by the sign-up password rules
pub const PASSWORD_SPECIALS: &str = "!@#$%^&*()-_=+[]{}|;:,.<>?";

/// Deterministic seed for reproducible data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Seed(u64);

impl Seed {
    /// Create a seed from a u64 value
    #[must_use]
    pub const fn from_u64(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw seed value
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    const fn new(seed: Seed) -> Self {
        // xorshift never leaves zero
        let state = if seed.0 == 0 { 1 } else { seed.0 };
        Self { state }
    }

    const fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Uniform-ish value in `min..=max`
    const fn next_inclusive(&mut self, min: u64, max: u64) -> u64 {
        if min >= max {
            return min;
        }
        min + (self.next() % (max - min + 1))
    }

    fn index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        (self.next() % len as u64) as usize
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.index(items.len())]
    }

    fn pick_byte(&mut self, set: &[u8]) -> char {
        char::from(set[self.index(set.len())])
    }

    const fn coin(&mut self) -> bool {
        self.next() & 1 == 1
    }
}

/// Values for the sign-up form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignUpForm {
    /// Full name
    pub full_name: String,
    /// Email address
    pub email: String,
    /// Ten-digit mobile number
    pub phone: String,
    /// Password, also typed into the confirmation field
    pub password: String,
}

/// Seeded generator for form data
#[derive(Debug, Clone)]
pub struct TestDataGenerator {
    seed: Seed,
    rng: Xorshift64,
}

impl TestDataGenerator {
    /// Generator replaying the stream for `seed`
    #[must_use]
    pub fn new(seed: Seed) -> Self {
        Self {
            seed,
            rng: Xorshift64::new(seed),
        }
    }

    /// Generator seeded from the clock; the seed is logged for replay
    #[must_use]
    pub fn from_entropy() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0x9E37_79B9_7F4A_7C15, |d| d.as_nanos() as u64);
        let seed = Seed::from_u64(nanos);
        debug!(seed = seed.value(), "test data seed");
        Self::new(seed)
    }

    /// Seed this generator started from
    #[must_use]
    pub const fn seed(&self) -> Seed {
        self.seed
    }

    /// `"Feedback: "` followed by 8 to 15 vocabulary words and `" #auto"`
    pub fn feedback_message(&mut self) -> String {
        let count = self.rng.next_inclusive(8, 15) as usize;
        let words: Vec<&str> = (0..count).map(|_| self.rng.pick(FEEDBACK_WORDS)).collect();
        format!("Feedback: {} #auto", words.join(" "))
    }

    /// `n` upper-case ASCII letters
    pub fn random_alpha(&mut self, n: usize) -> String {
        (0..n).map(|_| self.rng.pick_byte(UPPER)).collect()
    }

    fn mixed_case_word(&mut self, min: u64, max: u64) -> String {
        let len = self.rng.next_inclusive(min, max) as usize;
        (0..len)
            .map(|_| {
                let c = self.rng.pick_byte(LOWER);
                if self.rng.coin() {
                    c.to_ascii_uppercase()
                } else {
                    c
                }
            })
            .collect()
    }

    /// `"Zolvit <word> Company Ltd"` with a 5 to 8 letter mixed-case word
    pub fn company_name(&mut self) -> String {
        format!("Zolvit {} Company Ltd", self.mixed_case_word(5, 8))
    }

    /// One of [`DESIGNATIONS`]
    pub fn designation(&mut self) -> &'static str {
        self.rng.pick(DESIGNATIONS)
    }

    /// One of [`BUSINESS_TYPES`]
    pub fn business_type(&mut self) -> &'static str {
        self.rng.pick(BUSINESS_TYPES)
    }

    /// One of [`EMPLOYEE_COUNTS`]
    pub fn employee_count(&mut self) -> &'static str {
        self.rng.pick(EMPLOYEE_COUNTS)
    }

    /// One of [`TURNOVERS`]
    pub fn turnover(&mut self) -> &'static str {
        self.rng.pick(TURNOVERS)
    }

    /// Ten digits, the first one 7, 8 or 9
    pub fn indian_mobile(&mut self) -> String {
        let first = self.rng.next_inclusive(7, 9);
        let rest = self.rng.next_inclusive(0, 999_999_999);
        format!("{first}{rest:09}")
    }

    /// Password of at least 8 characters with an upper-case letter, a
    /// lower-case letter, a digit and one of [`PASSWORD_SPECIALS`]
    pub fn strong_password(&mut self, length: usize) -> String {
        let length = length.max(8);
        let specials = PASSWORD_SPECIALS.as_bytes();
        let all: Vec<u8> = [UPPER, LOWER, DIGITS, specials].concat();

        let mut chars = vec![
            self.rng.pick_byte(UPPER),
            self.rng.pick_byte(LOWER),
            self.rng.pick_byte(DIGITS),
            self.rng.pick_byte(specials),
        ];
        while chars.len() < length {
            chars.push(self.rng.pick_byte(&all));
        }
        // Fisher-Yates
        for i in (1..chars.len()).rev() {
            let j = self.rng.index(i + 1);
            chars.swap(i, j);
        }
        chars.into_iter().collect()
    }

    /// `<prefix>+<8 lower-case letters>@example.com`
    pub fn email(&mut self, prefix: &str) -> String {
        let tag: String = (0..8).map(|_| self.rng.pick_byte(LOWER)).collect();
        format!("{prefix}+{tag}@example.com")
    }

    /// Complete sign-up form
    pub fn sign_up_form(&mut self) -> SignUpForm {
        let first = self.mixed_case_word(4, 7);
        let last = self.mixed_case_word(4, 9);
        SignUpForm {
            full_name: format!("{} {}", capitalize(&first), capitalize(&last)),
            email: self.email("qa.automation"),
            phone: self.indian_mobile(),
            password: self.strong_password(12),
        }
    }
}

fn capitalize(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(c) => c.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    mod seed_tests {
        use super::*;

        #[test]
        fn test_seed_roundtrip() {
            assert_eq!(Seed::from_u64(12345).value(), 12345);
            assert_eq!(Seed::default().value(), 0);
        }

        #[test]
        fn test_same_seed_same_stream() {
            let mut a = TestDataGenerator::new(Seed::from_u64(42));
            let mut b = TestDataGenerator::new(Seed::from_u64(42));
            assert_eq!(a.feedback_message(), b.feedback_message());
            assert_eq!(a.sign_up_form(), b.sign_up_form());
        }

        #[test]
        fn test_zero_seed_still_produces_data() {
            let mut gen = TestDataGenerator::new(Seed::from_u64(0));
            assert_eq!(gen.random_alpha(6).len(), 6);
        }
    }

    mod value_tests {
        use super::*;

        #[test]
        fn test_company_name_shape() {
            let mut gen = TestDataGenerator::new(Seed::from_u64(9));
            let name = gen.company_name();
            let word = name
                .strip_prefix("Zolvit ")
                .and_then(|s| s.strip_suffix(" Company Ltd"))
                .unwrap();
            assert!((5..=8).contains(&word.len()));
            assert!(word.chars().all(|c| c.is_ascii_alphabetic()));
        }

        #[test]
        fn test_pickers_stay_in_lists() {
            let mut gen = TestDataGenerator::new(Seed::from_u64(3));
            for _ in 0..50 {
                assert!(DESIGNATIONS.contains(&gen.designation()));
                assert!(BUSINESS_TYPES.contains(&gen.business_type()));
                assert!(EMPLOYEE_COUNTS.contains(&gen.employee_count()));
                assert!(TURNOVERS.contains(&gen.turnover()));
            }
        }

        #[test]
        fn test_short_password_is_padded_to_eight() {
            let mut gen = TestDataGenerator::new(Seed::from_u64(5));
            assert_eq!(gen.strong_password(3).len(), 8);
        }

        #[test]
        fn test_sign_up_form() {
            let mut gen = TestDataGenerator::new(Seed::from_u64(77));
            let form = gen.sign_up_form();
            assert!(form.email.starts_with("qa.automation+"));
            assert!(form.email.ends_with("@example.com"));
            assert_eq!(form.full_name.split(' ').count(), 2);
            assert_eq!(form.phone.len(), 10);
        }
    }

    proptest! {
        #[test]
        fn prop_feedback_word_count(seed in any::<u64>()) {
            let msg = TestDataGenerator::new(Seed::from_u64(seed)).feedback_message();
            let body = msg.strip_prefix("Feedback: ").unwrap().strip_suffix(" #auto").unwrap();
            let words: Vec<&str> = body.split(' ').collect();
            prop_assert!((8..=15).contains(&words.len()));
            prop_assert!(words.iter().all(|w| FEEDBACK_WORDS.contains(w)));
        }

        #[test]
        fn prop_mobile_is_valid(seed in any::<u64>()) {
            let phone = TestDataGenerator::new(Seed::from_u64(seed)).indian_mobile();
            prop_assert_eq!(phone.len(), 10);
            prop_assert!(phone.chars().all(|c| c.is_ascii_digit()));
            prop_assert!(matches!(phone.as_bytes()[0], b'7'..=b'9'));
        }

        #[test]
        fn prop_password_has_every_class(seed in any::<u64>(), len in 0usize..32) {
            let pw = TestDataGenerator::new(Seed::from_u64(seed)).strong_password(len);
            prop_assert_eq!(pw.chars().count(), len.max(8));
            prop_assert!(pw.chars().any(|c| c.is_ascii_uppercase()));
            prop_assert!(pw.chars().any(|c| c.is_ascii_lowercase()));
            prop_assert!(pw.chars().any(|c| c.is_ascii_digit()));
            prop_assert!(pw.chars().any(|c| PASSWORD_SPECIALS.contains(c)));
        }

        #[test]
        fn prop_random_alpha(seed in any::<u64>(), n in 0usize..40) {
            let s = TestDataGenerator::new(Seed::from_u64(seed)).random_alpha(n);
            prop_assert_eq!(s.len(), n);
            prop_assert!(s.chars().all(|c| c.is_ascii_uppercase()));
        }
    }
}
