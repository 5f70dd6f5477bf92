/// Source of fresh placeholder names for one verification run
///
/// Names are `hint!N` with `N` strictly increasing, so two placeholders
/// drawn from the same generator never collide. The hint is reduced to
/// characters that are valid in an SMT-LIB simple symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FreshNames {
    next: u64,
}

impl FreshNames {
    /// Generator starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Generator starting at `next`
    pub fn starting_at(next: u64) -> Self {
        Self { next }
    }

    /// Draw the next name
    pub fn fresh(&mut self, hint: &str) -> String {
        let n = self.next;
        self.next += 1;
        format!("{}!{}", sanitize(hint), n)
    }

    /// Number that the next drawn name will carry
    pub fn peek(&self) -> u64 {
        self.next
    }
}

fn sanitize(hint: &str) -> String {
    let cleaned: String = hint
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    match cleaned.chars().next() {
        None => "v".to_string(),
        Some(c) if c.is_ascii_digit() => format!("v{}", cleaned),
        Some(_) => cleaned,
    }
}
