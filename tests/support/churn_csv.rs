//! Synthetic churn tables shaped like the real dataset.

pub const HEADER: &str =
    "RowNumber,CustomerId,Surname,CreditScore,Geography,Gender,Age,Tenure,Balance,Exited";

const GEOGRAPHIES: [&str; 3] = ["France", "Spain", "Germany"];

/// One CSV line for customer `n`.
pub fn row(n: usize) -> String {
    format!(
        "{},{},\"Surname {}\",{},{},{},{},{},{:.2},{}",
        n,
        15_600_000 + n,
        n,
        350 + (n * 37) % 500,
        GEOGRAPHIES[n % GEOGRAPHIES.len()],
        if n % 2 == 0 { "Female" } else { "Male" },
        18 + n % 60,
        n % 11,
        (n * 1234) as f64 / 3.0,
        usize::from(n % 5 == 0)
    )
}

/// `unique` distinct rows followed by `duplicates` exact copies of earlier rows.
pub fn csv_with_duplicates(unique: usize, duplicates: usize) -> String {
    let mut lines = vec![HEADER.to_string()];
    lines.extend((1..=unique).map(row));
    lines.extend((0..duplicates).map(|i| row(1 + (i * 7) % unique)));
    let mut text = lines.join("\n");
    text.push('\n');
    text
}
