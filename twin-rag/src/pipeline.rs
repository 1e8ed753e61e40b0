//! Per-question orchestration: validate, retrieve, assemble, prompt, generate.
//!
//! No state is kept between calls.

use std::sync::Arc;

use tracing::{debug, info};

use crate::api_types::{QaAnswer, UsedChunk};
use crate::context::ContextAssembler;
use crate::error::Answer;
use crate::generate::Generator;
use crate::progress::{NoopProgress, PipelineState, Progress};
use crate::prompt;
use crate::retrieve::Retriever;

/// Question in, [`Answer`] out.
#[derive(Clone)]
pub struct RagPipeline {
    retriever: Retriever,
    assembler: ContextAssembler,
    generator: Generator,
    persona: String,
    top_k: usize,
    progress: Arc<dyn Progress>,
}

impl RagPipeline {
    pub fn new(
        retriever: Retriever,
        assembler: ContextAssembler,
        generator: Generator,
        persona: impl Into<String>,
        top_k: usize,
    ) -> Self {
        Self {
            retriever,
            assembler,
            generator,
            persona: persona.into(),
            top_k: top_k.max(1),
            progress: Arc::new(NoopProgress),
        }
    }

    /// Replaces the progress reporter.
    pub fn with_progress(mut self, progress: Arc<dyn Progress>) -> Self {
        self.progress = progress;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Answers with the configured top-k.
    pub async fn answer(&self, question: &str) -> Answer {
        self.answer_with(question, self.top_k).await
    }

    pub async fn answer_with(&self, question: &str, top_k: usize) -> Answer {
        self.answer_with_context(question, top_k).await.answer
    }

    /// Runs the pipeline and also returns the hits whose lines made it into the prompt.
    ///
    /// - blank question: [`Answer::MissingQuestion`], nothing is retrieved
    /// - no hits or no usable text: [`Answer::NotFound`], the model is not called
    /// - generation failure: [`Answer::Failed`]
    pub async fn answer_with_context(&self, question: &str, top_k: usize) -> QaAnswer {
        self.progress.state(PipelineState::Start);
        if question.trim().is_empty() {
            self.progress.finish("missing question");
            return QaAnswer {
                answer: Answer::MissingQuestion,
                context: Vec::new(),
            };
        }

        self.progress.state(PipelineState::Retrieving);
        let hits = self.retriever.retrieve(question, top_k).await;
        if hits.is_empty() {
            info!("no hits; answering not found");
            self.progress.finish("not found");
            return QaAnswer {
                answer: Answer::NotFound,
                context: Vec::new(),
            };
        }

        self.progress.state(PipelineState::Assembling);
        let block = self.assembler.assemble(&hits);
        if block.is_empty() {
            info!(hits = hits.len(), "hits carried no text; answering not found");
            self.progress.finish("not found");
            return QaAnswer {
                answer: Answer::NotFound,
                context: Vec::new(),
            };
        }
        let context = block
            .sources()
            .iter()
            .filter_map(|&i| hits.get(i))
            .map(UsedChunk::from)
            .collect();

        self.progress.state(PipelineState::Prompting);
        let prompt = prompt::build(question, &block, &self.persona);
        debug!(lines = block.lines().len(), chars = prompt.user.len(), "prompt built");

        self.progress.state(PipelineState::Generating);
        let answer = self.generator.generate(&prompt).await;
        self.progress.finish("done");

        QaAnswer { answer, context }
    }
}
