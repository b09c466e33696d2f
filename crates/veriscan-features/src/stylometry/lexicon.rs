//! Word lists used by the stylometric features

/// English stopwords (the NLTK list the classifier was trained against)
pub const STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
];

/// Forms of be/have/do, tagged as verbs
pub const AUXILIARIES: &[&str] = &[
    "am", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "having",
    "do", "does", "did", "doing",
];

/// Modals; the following word is read as a base-form verb
pub const MODALS: &[&str] = &[
    "can", "could", "may", "might", "must", "shall", "should", "will", "would", "ought",
];

/// Words after which a noun phrase begins
pub const DETERMINERS: &[&str] = &[
    "a", "an", "the", "this", "that", "these", "those", "my", "your", "his", "her", "its", "our",
    "their", "some", "any", "each", "every", "no", "many", "much", "several", "another",
];

/// Closed-class words that are neither nouns, verbs nor adjectives
pub const FUNCTION_WORDS: &[&str] = &[
    "i", "me", "we", "us", "you", "he", "him", "she", "it", "they", "them", "myself",
    "yourself", "himself", "herself", "itself", "ourselves", "themselves", "who", "whom",
    "whose", "which", "what", "and", "but", "or", "nor", "so", "yet", "if", "because", "as",
    "until", "while", "although", "though", "unless", "since", "whether", "of", "at", "by",
    "for", "with", "about", "against", "between", "into", "through", "during", "before",
    "after", "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over",
    "under", "again", "further", "then", "once", "here", "there", "when", "where", "why",
    "how", "all", "both", "not", "only", "too", "very", "just", "now", "also", "never",
    "always", "often", "still", "even", "almost", "already", "soon", "perhaps", "quite",
    "rather", "within", "without", "upon", "across", "toward", "towards", "among", "around",
    "mine", "yours", "hers", "ours", "theirs",
];

/// Frequent verbs whose form gives no suffix cue
pub const COMMON_VERBS: &[&str] = &[
    "say", "says", "said", "make", "makes", "made", "go", "goes", "went", "gone", "take",
    "takes", "took", "taken", "get", "gets", "got", "know", "knows", "knew", "known", "think",
    "thinks", "thought", "see", "sees", "saw", "seen", "come", "comes", "came", "want",
    "wants", "use", "uses", "find", "finds", "found", "give", "gives", "gave", "given", "tell",
    "tells", "told", "seem", "seems", "feel", "feels", "felt", "try", "tries", "leave",
    "leaves", "left", "put", "puts", "mean", "means", "meant", "keep", "keeps", "kept", "let",
    "lets", "begin", "begins", "began", "show", "shows", "showed", "shown", "hear", "heard",
    "run", "runs", "ran", "hold", "holds", "held", "bring", "brings", "brought", "write",
    "writes", "wrote", "written", "become", "becomes", "became", "provide", "provides",
    "sat", "sit", "sits", "stand", "stood", "lose", "lost", "pay", "paid", "meet", "met",
    "include", "includes", "continue", "continues", "set", "learn", "learns", "change",
    "lead", "leads", "led", "understand", "understood", "speak", "spoke", "read", "reads",
    "allow", "allows", "add", "adds", "grow", "grew", "offer", "remember", "love", "loves",
    "consider", "appear", "appears", "buy", "bought", "wait", "serve", "die", "died", "send",
    "sent", "expect", "build", "built", "stay", "fall", "fell", "reach", "kill", "remain",
    "remains", "suggest", "suggests", "raise", "pass", "sell", "sold", "require", "requires",
    "need", "needs", "like", "likes", "help", "helps", "ask", "asks", "seemed",
];

/// Frequent adjectives whose form gives no suffix cue
pub const COMMON_ADJECTIVES: &[&str] = &[
    "good", "new", "first", "last", "long", "great", "little", "own", "other", "old", "right",
    "big", "high", "different", "small", "large", "next", "early", "young", "important",
    "few", "bad", "same", "able", "best", "better", "sure", "free", "true", "whole", "clear",
    "full", "hard", "easy", "strong", "real", "low", "late", "general", "specific", "certain",
    "major", "simple", "recent", "main", "short", "open", "human", "common", "poor", "natural",
    "significant", "similar", "hot", "cold", "dead", "single", "deep", "wide", "fine", "happy",
    "quick", "slow", "dark", "light", "red", "blue", "green", "black", "white", "brown",
    "lazy", "nice", "rich", "ready", "serious", "whole", "top", "key", "huge", "tiny",
];
