use rand::Rng;
use rand::seq::SliceRandom;

pub const INTRO_MESSAGE: &str = "Answer a few cards and your score will show up here.";

const BUCKETS: &[(u32, &[&str])] = &[
    (
        0,
        &[
            "Under 10%? Were you studying or napping with the book open?",
            "Below 10%... bold of you to show up. Try again after a snack.",
            "Not quite 10% yet. Every expert was once this lost, probably.",
            "Less than 10%. Maybe you were counting in seconds instead of words?",
            "Below 10%? Good news: there is only one direction from here.",
        ],
    ),
    (
        10,
        &[
            "10% right. Did you study with one eye closed?",
            "Slow and steady, with a strong emphasis on slow.",
            "Everyone starts somewhere. This is a very early somewhere.",
        ],
    ),
    (
        20,
        &[
            "20% already. Still a long road, but better than 10%!",
            "At this pace you will finish the deck next century.",
            "Cheer up, you beat everyone who did not try at all.",
        ],
    ),
    (
        30,
        &[
            "30% correct. Smart or lucky? We may never know.",
            "You are officially doing better than random guessing.",
            "Some of it is sticking... or you are a very good guesser.",
        ],
    ),
    (
        40,
        &[
            "Past 40%! That deserves a small celebration.",
            "Not bad at all, though Einstein is not worried yet.",
            "Real progress. Plenty more cards are waiting for you, though.",
        ],
    ),
    (
        50,
        &[
            "Halfway there! Enough to pass a cram exam.",
            "50%. Enough that nobody will nag you about homework tonight.",
            "Halfway up the hill. Keep climbing!",
        ],
    ),
    (
        60,
        &[
            "60%! The summit is getting close.",
            "Solid work, just a bit more push.",
            "You are now officially smarter than a toaster.",
        ],
    ),
    (
        70,
        &[
            "70%! You may now call yourself a part-time genius.",
            "Great job. You could fool people into thinking you are fluent.",
            "A little more and you will be a master of educated guesses.",
        ],
    ),
    (
        80,
        &[
            "80%! Smarter than yesterday's you, for sure.",
            "Almost at the top. Only 20% to go!",
            "A little more and you will be a flashcard professor.",
        ],
    ),
    (
        90,
        &[
            "90%! You are about to beat the whole game.",
            "Nearly perfect. Not many people make it this far.",
            "You are a flashcard legend now.",
        ],
    ),
    (
        100,
        &[
            "100%! Academic master! Language genius!",
            "Every single card right. Go take a well-earned rest.",
            "Unbelievable. Maybe you should be teaching this class.",
        ],
    ),
];

/// Fixed message list for a decile bucket, if one is defined.
pub fn bucket_messages(bucket: u32) -> Option<&'static [&'static str]> {
    BUCKETS
        .iter()
        .find(|(b, _)| *b == bucket)
        .map(|(_, messages)| *messages)
}

/// Decile bucket for a percentage: `floor(p / 10) * 10`, so exactly 100
/// lands in its own bucket.
pub fn bucket_for(percentage: f64) -> i64 {
    (percentage / 10.0).floor() as i64 * 10
}

/// Picks an encouragement line for a final score. No answers (NaN) or a
/// zero score get the introductory message.
pub fn select<R: Rng + ?Sized>(percentage: f64, rng: &mut R) -> &'static str {
    if !percentage.is_finite() || percentage == 0.0 {
        return INTRO_MESSAGE;
    }

    let messages = u32::try_from(bucket_for(percentage))
        .ok()
        .and_then(bucket_messages)
        .or_else(|| bucket_messages(10))
        .unwrap_or(&[INTRO_MESSAGE]);

    messages.choose(rng).copied().unwrap_or(INTRO_MESSAGE)
}
