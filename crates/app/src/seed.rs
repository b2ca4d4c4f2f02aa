use std::collections::BTreeMap;

use anyhow::Result;
use catalog_core::model::{
    ArticleId, Difficulty, Item, ItemId, LearningArticle, QuestionId, QuizQuestion,
};
use storage::repository::{ArticleRepository, ItemRepository, QuizRepository, Storage};

struct SeedTool {
    id: u64,
    title: &'static str,
    description: &'static str,
    category: &'static str,
    price: &'static str,
    link: &'static str,
}

const TOOLS: &[SeedTool] = &[
    SeedTool {
        id: 1,
        title: "ChatGPT",
        description: "Conversational assistant for drafting and Q&A",
        category: "Text",
        price: "Freemium",
        link: "https://chat.openai.com",
    },
    SeedTool {
        id: 2,
        title: "Midjourney",
        description: "Image generation from text prompts",
        category: "Image",
        price: "Paid",
        link: "https://www.midjourney.com",
    },
    SeedTool {
        id: 3,
        title: "GitHub Copilot",
        description: "Code completion inside the editor",
        category: "Code",
        price: "Paid",
        link: "https://github.com/features/copilot",
    },
    SeedTool {
        id: 4,
        title: "Claude",
        description: "Assistant for long documents and analysis",
        category: "Text",
        price: "Freemium",
        link: "https://claude.ai",
    },
    SeedTool {
        id: 5,
        title: "Stable Diffusion",
        description: "Open image generation model",
        category: "Image",
        price: "Free",
        link: "https://stability.ai",
    },
    SeedTool {
        id: 6,
        title: "Whisper",
        description: "Speech recognition and transcription",
        category: "Audio",
        price: "Free",
        link: "https://openai.com/research/whisper",
    },
    SeedTool {
        id: 7,
        title: "ElevenLabs",
        description: "Voice synthesis and cloning",
        category: "Audio",
        price: "Freemium",
        link: "https://elevenlabs.io",
    },
    SeedTool {
        id: 8,
        title: "Cursor",
        description: "AI-first code editor",
        category: "Code",
        price: "Freemium",
        link: "https://cursor.sh",
    },
    SeedTool {
        id: 9,
        title: "Perplexity",
        description: "Answer engine with cited sources",
        category: "Search",
        price: "Freemium",
        link: "https://www.perplexity.ai",
    },
    SeedTool {
        id: 10,
        title: "Runway",
        description: "Video generation and editing",
        category: "Video",
        price: "Paid",
        link: "https://runwayml.com",
    },
];

struct SeedQuestion {
    text: &'static str,
    options: &'static [(&'static str, &'static str)],
    correct: &'static str,
}

struct SeedArticle {
    id: u64,
    title: &'static str,
    author: &'static str,
    content: &'static str,
    difficulty: Difficulty,
    url: &'static str,
    questions: &'static [SeedQuestion],
}

const ARTICLES: &[SeedArticle] = &[
    SeedArticle {
        id: 1,
        title: "What is machine learning",
        author: "Catalog team",
        content: "Machine learning fits a model to examples instead of hand-writing rules. \
                  Supervised learning uses labelled data; unsupervised learning finds structure.",
        difficulty: Difficulty::Beginner,
        url: "https://en.wikipedia.org/wiki/Machine_learning",
        questions: &[
            SeedQuestion {
                text: "What does a model learn from?",
                options: &[
                    ("a", "Examples"),
                    ("b", "Hand-written rules"),
                    ("c", "Random noise"),
                ],
                correct: "a",
            },
            SeedQuestion {
                text: "Labelled data is used by...",
                options: &[("a", "Unsupervised learning"), ("b", "Supervised learning")],
                correct: "b",
            },
            SeedQuestion {
                text: "Clustering is an example of...",
                options: &[("a", "Supervised learning"), ("b", "Unsupervised learning")],
                correct: "b",
            },
            SeedQuestion {
                text: "Training adjusts the model's...",
                options: &[("a", "Parameters"), ("b", "Screen resolution")],
                correct: "a",
            },
        ],
    },
    SeedArticle {
        id: 2,
        title: "Prompt engineering basics",
        author: "Catalog team",
        content: "Clear instructions, examples and an explicit output format make model answers \
                  more reliable. Break long tasks into steps.",
        difficulty: Difficulty::Intermediate,
        url: "https://www.promptingguide.ai",
        questions: &[
            SeedQuestion {
                text: "Giving the model examples is called...",
                options: &[("a", "Few-shot prompting"), ("b", "Fine-tuning")],
                correct: "a",
            },
            SeedQuestion {
                text: "A stated output format makes answers...",
                options: &[("a", "Less predictable"), ("b", "More predictable")],
                correct: "b",
            },
            SeedQuestion {
                text: "Long tasks are best...",
                options: &[("a", "Split into steps"), ("b", "Sent as one sentence")],
                correct: "a",
            },
        ],
    },
    SeedArticle {
        id: 3,
        title: "How transformers use attention",
        author: "Catalog team",
        content: "Self-attention lets every token weigh every other token. Stacks of attention and \
                  feed-forward layers form the transformer.",
        difficulty: Difficulty::Advanced,
        url: "https://arxiv.org/abs/1706.03762",
        questions: &[],
    },
];

/// Validated demo rows, ready to upsert.
pub struct DemoCatalog {
    pub items: Vec<Item>,
    pub articles: Vec<LearningArticle>,
    pub questions: Vec<QuizQuestion>,
}

/// # Errors
///
/// Fails if a built-in row does not pass domain validation.
pub fn demo_catalog() -> Result<DemoCatalog, catalog_core::Error> {
    let items = TOOLS
        .iter()
        .map(|tool| {
            Item::new(
                ItemId::new(tool.id),
                tool.title,
                tool.description,
                tool.category,
                tool.price,
                tool.link,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut articles = Vec::with_capacity(ARTICLES.len());
    let mut questions = Vec::new();
    for seed in ARTICLES {
        let article = LearningArticle::new(
            ArticleId::new(seed.id),
            seed.title,
            seed.author,
            seed.content,
            seed.difficulty,
            seed.url,
        )?;
        for (n, seed_question) in (1u64..).zip(seed.questions) {
            let options: BTreeMap<String, String> = seed_question
                .options
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect();
            questions.push(QuizQuestion::new(
                QuestionId::new(n),
                article.id(),
                seed_question.text,
                options,
                seed_question.correct,
            )?);
        }
        articles.push(article);
    }

    Ok(DemoCatalog {
        items,
        articles,
        questions,
    })
}

/// Upserts the demo catalog. Safe to run repeatedly.
///
/// # Errors
///
/// Fails on invalid seed rows or storage errors.
pub async fn run(storage: &Storage) -> Result<SeedSummary> {
    let demo = demo_catalog()?;

    for item in &demo.items {
        storage.items.upsert_item(item).await?;
    }
    // Articles first: questions reference them.
    for article in &demo.articles {
        storage.articles.upsert_article(article).await?;
    }
    for question in &demo.questions {
        storage.quizzes.upsert_question(question).await?;
    }

    let summary = SeedSummary {
        tools: demo.items.len(),
        articles: demo.articles.len(),
        questions: demo.questions.len(),
    };
    tracing::info!(
        tools = summary.tools,
        articles = summary.articles,
        questions = summary.questions,
        "seeded demo data"
    );
    Ok(summary)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct SeedSummary {
    pub tools: usize,
    pub articles: usize,
    pub questions: usize,
}
