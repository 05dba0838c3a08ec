/// `correct / answered` as a percentage; NaN when nothing was answered.
pub fn percentage(correct: usize, answered: usize) -> f64 {
    if answered == 0 {
        return f64::NAN;
    }
    correct as f64 / answered as f64 * 100.0
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Grade {
    Good,
    Fair,
    Poor,
}

pub fn grade(percentage: f64) -> Grade {
    if percentage >= 80.0 {
        Grade::Good
    } else if percentage >= 50.0 {
        Grade::Fair
    } else {
        Grade::Poor
    }
}
