use std::collections::HashMap;

use colored::Colorize;

use super::Analysis;

pub(super) fn print_common_failures(analysis: &Analysis) {
    print_ranked("Repeated failure messages:", &analysis.failure_messages, 10);
}

pub(super) fn print_common_skips(analysis: &Analysis) {
    print_ranked("Skip reasons:", &analysis.skip_reasons, 5);
}

fn print_ranked(title: &str, counts: &HashMap<String, usize>, limit: usize) {
    if counts.is_empty() {
        return;
    }

    let mut ranked: Vec<_> = counts.iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    println!("\n{}", title.bold());
    for (message, count) in ranked.into_iter().take(limit) {
        println!("  {:>4}x {}", count, message);
    }
}
