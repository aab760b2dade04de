use thiserror::Error;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MissingInput {
    Categories,
    Salaries,
    Both,
}

#[derive(Debug, Error, PartialEq)]
pub enum ProjectionError {
    #[error(
        "invalid periods order for salary {salary_index}: period {period_index} starts at year {from}, \
         not after year {previous_from}"
    )]
    InvalidVarianceOrder {
        salary_index: usize,
        period_index: usize,
        previous_from: u32,
        from: u32,
    },

    #[error("please add at least {} first", missing_label(.0))]
    DegenerateInput(MissingInput),
}

fn missing_label(missing: &MissingInput) -> &'static str {
    match missing {
        MissingInput::Categories => "one category",
        MissingInput::Salaries => "one salary",
        MissingInput::Both => "some category or salary",
    }
}
