//! Static phrase tables used by the intent classifier and person extractor.
//!
//! Single-word entries match whole words; entries containing a space or
//! punctuation match as substrings of the normalised turn.

pub const PERSON_LOOKUP_PHRASES: &[&str] = &[
    "who is",
    "who's",
    "who was",
    "tell me about",
    "do you know",
    "what do you know about",
    "information about",
    "info about",
    "info on",
    "look up",
    "search for",
];

pub const SPECIFIC_CREATOR_PHRASES: &[&str] = &[
    "which developer",
    "which person built",
    "which person made",
    "name of your developer",
    "name of your creator",
    "names of your creators",
    "who specifically",
    "who exactly built",
    "who exactly made",
    "who exactly created",
    "the person who built you",
    "the person who made you",
    "your developer's name",
    "your lead developer",
];

pub const CREATOR_PHRASES: &[&str] = &[
    "who built you",
    "who made you",
    "who created you",
    "who developed you",
    "who designed you",
    "who programmed you",
    "who is your creator",
    "who's your creator",
    "your creator",
    "your developer",
    "who owns you",
];

pub const IDENTITY_PHRASES: &[&str] = &[
    "what does casi stand for",
    "what does casi mean",
    "casi stand for",
    "what is casi",
    "what's casi",
    "who is casi",
    "who are you",
    "what are you",
    "your name",
    "introduce yourself",
    "are you a bot",
    "are you human",
];

/// Matched only at the start of the turn.
pub const GENERAL_INTERROGATIVES: &[&str] = &[
    "what is",
    "what are",
    "what's",
    "what was",
    "what were",
    "who are",
    "when is",
    "when was",
    "when did",
    "where is",
    "where are",
    "why is",
    "why are",
    "why do",
    "why does",
    "how does",
    "how do",
    "how many",
    "how much",
    "how is",
    "how to",
    "can you explain",
    "explain",
    "define",
    "describe",
    "which",
];

pub const TRAVEL_KEYWORDS: &[&str] = &[
    "travel",
    "trip",
    "flight",
    "flights",
    "fly",
    "airline",
    "airport",
    "visa",
    "passport",
    "hotel",
    "hotels",
    "booking",
    "itinerary",
    "luggage",
    "baggage",
    "vacation",
    "destination",
    "layover",
    "cruise",
    "check-in",
    "boarding pass",
    "book a",
];

pub const GREETINGS: &[&str] = &[
    "hello",
    "hi",
    "hey",
    "hiya",
    "howdy",
    "greetings",
    "good morning",
    "good afternoon",
    "good evening",
];

pub const FAREWELLS: &[&str] = &[
    "bye",
    "goodbye",
    "good bye",
    "see you",
    "see ya",
    "take care",
    "good night",
    "farewell",
    "thanks",
    "thank you",
];

pub const CLARIFICATIONS: &[&str] = &[
    "what do you mean",
    "i don't understand",
    "i dont understand",
    "can you clarify",
    "clarify",
    "say that again",
    "rephrase",
    "not sure what you mean",
    "huh",
];

pub const IT_KEYWORDS: &[&str] = &[
    "password",
    "vpn",
    "wifi",
    "wi-fi",
    "printer",
    "outlook",
    "laptop",
    "computer",
    "not working",
    "error",
    "crash",
    "crashed",
    "frozen",
    "install",
    "software",
    "internet",
    "network",
    "locked out",
    "account locked",
    "log in",
    "login",
    "keyboard",
    "monitor",
];

/// Openers that mark a turn as continuing the previous exchange.
pub const FOLLOW_UP_OPENERS: &[&str] = &["and", "also", "so", "but"];

pub const FOLLOW_UP_PHRASES: &[&str] = &[
    "what about",
    "how about",
    "tell me more",
    "more about",
    "what else",
    "go on",
    "elaborate",
    "more details",
    "anything else",
];

/// Connectives for the follow-up flag (word-level unless multi-word).
pub const FOLLOW_UP_CONNECTIVES: &[&str] = &[
    "and",
    "also",
    "what about",
    "how about",
    "tell me more",
    "what else",
    "more",
    "another",
];

pub const PRONOUNS: &[&str] = &[
    "it",
    "its",
    "this",
    "that",
    "they",
    "them",
    "their",
    "he",
    "him",
    "his",
    "she",
    "her",
    "those",
    "these",
    "the company",
];

/// Pronouns that can stand for a person named earlier.
pub const PERSONAL_PRONOUNS: &[&str] = &["he", "him", "his", "she", "her", "hers", "they", "them", "their"];

pub const COMPARISON_PHRASES: &[&str] = &[
    "compare",
    "comparison",
    "versus",
    "vs",
    "difference between",
    "better than",
    "which is better",
];

pub const REQUEST_PHRASES: &[&str] = &[
    "can you",
    "could you",
    "would you",
    "please",
    "i need",
    "i want",
    "help me",
];

/// Keyword → topic label.
pub const TOPIC_KEYWORDS: &[(&str, &str)] = &[
    ("casto", "casto"),
    ("founder", "leadership"),
    ("founded", "history"),
    ("ceo", "leadership"),
    ("president", "leadership"),
    ("chairman", "leadership"),
    ("leadership", "leadership"),
    ("role", "leadership"),
    ("history", "history"),
    ("services", "services"),
    ("service", "services"),
    ("accreditation", "accreditations"),
    ("accreditations", "accreditations"),
    ("certified", "accreditations"),
    ("travel", "travel"),
    ("flight", "travel"),
    ("flights", "travel"),
    ("hotel", "travel"),
    ("visa", "travel"),
    ("passport", "travel"),
    ("password", "it support"),
    ("vpn", "it support"),
    ("printer", "it support"),
    ("outlook", "it support"),
    ("wifi", "it support"),
];
