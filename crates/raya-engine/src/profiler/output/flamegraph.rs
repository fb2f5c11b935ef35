//! Brendan Gregg folded stacks output format.
//!
//! Each line: `func1;func2;func3 <count>`
//!
//! Feed to `flamegraph.pl` or import into speedscope.app.

use crate::profiler::ResolvedProfileData;
use std::collections::BTreeMap;

impl ResolvedProfileData {
    /// Convert to folded stacks format (one stack per line, count appended).
    pub fn to_flamegraph(&self) -> String {
        // Aggregate identical stacks
        let mut stacks: BTreeMap<String, u32> = BTreeMap::new();

        for sample in &self.samples {
            let key = sample
                .frames
                .iter()
                .map(|f| {
                    if f.source_file.is_empty() {
                        f.function_name.clone()
                    } else {
                        format!(
                            "{} ({}:{})",
                            f.function_name, f.source_file, f.line_number
                        )
                    }
                })
                .collect::<Vec<_>>()
                .join(";");

            *stacks.entry(key).or_insert(0) += 1;
        }

        let mut output = String::new();
        for (stack, count) in &stacks {
            if !stack.is_empty() {
                output.push_str(stack);
                output.push(' ');
                output.push_str(&count.to_string());
                output.push('\n');
            }
        }
        output
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
