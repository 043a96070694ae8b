//! Target and strategy listing command implementation.

use pdpanel_targets::TargetRegistry;
use pdpanel_weights::available_strategies;

/// Print the default target registry and the weighting strategies.
pub(crate) fn run(detailed: bool) {
    println!("Default targets:");
    println!("{}", "-".repeat(60));
    for (name, definition) in TargetRegistry::defaults().iter() {
        if detailed {
            println!(
                "  {:12} {} dpd >= {:3} over {:2} periods",
                name, definition.direction, definition.threshold, definition.horizon
            );
        } else {
            println!("  {}", name);
        }
    }
    println!();

    println!("Weighting strategies:");
    println!("{}", "-".repeat(60));
    for info in available_strategies() {
        if detailed {
            println!("  {:22} - {}", info.name, info.description);
        } else {
            println!("  {}", info.name);
        }
    }
    println!();

    if !detailed {
        println!("Use --detailed for target definitions and strategy descriptions.\n");
    }
}
