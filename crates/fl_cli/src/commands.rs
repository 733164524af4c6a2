use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use fl_client::Services;
use fl_core::{
    Article, ArticleFilter, ArticleId, AuthService, Category, Credentials, Registration, SearchCriteria, Session,
};
use fl_editor::{
    DeleteOutcome, EditorError, EditorSession, EnrichmentOutcome, ListConfig, ListMutationCoordinator, SearchConfig,
    SearchQueryController, SearchSnapshot, SubmitReport,
};
use crate::input::{ellipsize, Input, TerminalConfirm};
use crate::session_file::SessionFile;
use crate::Commands;

pub struct App {
    services: Services,
    session_file: SessionFile,
    session: Option<Session>,
}

impl App {
    pub fn new(services: Services, session_file: SessionFile, session: Option<Session>) -> Self {
        Self {
            services,
            session_file,
            session,
        }
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn forget_session(&mut self) -> Result<()> {
        self.session = None;
        self.session_file.clear()
    }

    pub async fn run(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Login { email, password } => {
                let password = self.password(password).await?;
                let session = self.auth()?.login(&Credentials { email, password }).await?;
                self.remember(session)
            }
            Commands::Signup { name, email, password } => {
                let password = self.password(password).await?;
                let registration = Registration { name, email, password };
                let session = self.auth()?.signup(&registration).await?;
                self.remember(session)
            }
            Commands::Logout => {
                if let Some(auth) = &self.services.auth {
                    auth.logout();
                }
                self.forget_session()
            }
            Commands::Whoami => {
                match &self.session {
                    Some(session) => {
                        let user = &session.user;
                        println!("{} <{}>", user.name.as_deref().unwrap_or(&user.id), user.email);
                    }
                    None => println!("Not logged in"),
                }
                Ok(())
            }
            Commands::List {
                search,
                category,
                author,
                mine,
            } => {
                let author = if mine { Some(self.user_id()?) } else { author };
                let filter = ArticleFilter {
                    search,
                    category,
                    author,
                    ..ListConfig::default().filter()
                };
                self.list(&filter).await
            }
            Commands::Search { category } => self.search(category).await,
            Commands::Show { id, similar } => self.show(ArticleId::from(id), similar).await,
            Commands::New => {
                let session = EditorSession::create(self.services.content.clone(), self.services.enrichment.clone());
                compose(&session).await
            }
            Commands::Edit { id } => {
                let session = self.open(id).await?;
                compose(&session).await
            }
            Commands::Improve { id, save } => {
                let session = self.open(id).await?;
                println!("{}", session.improve().await?);
                finish_transform(&session, save).await
            }
            Commands::Prompt { id, instruction, save } => {
                let session = self.open(id).await?;
                session.set_prompt(instruction)?;
                println!("{}", session.apply_prompt().await?);
                finish_transform(&session, save).await
            }
            Commands::Delete { id, yes } => self.delete(ArticleId::from(id), yes).await,
        }
    }

    fn auth(&self) -> Result<Arc<dyn AuthService>> {
        self.services
            .auth
            .clone()
            .ok_or_else(|| anyhow!("Signing in is not available in offline mode"))
    }

    fn user_id(&self) -> Result<String> {
        self.session
            .as_ref()
            .map(|session| session.user.id.clone())
            .ok_or_else(|| anyhow!("Not logged in"))
    }

    async fn password(&self, given: Option<String>) -> Result<String> {
        if let Some(password) = given {
            return Ok(password);
        }
        match Input::stdin().ask("Password").await? {
            Some(password) if !password.is_empty() => Ok(password),
            _ => bail!("A password is required"),
        }
    }

    fn remember(&mut self, session: Session) -> Result<()> {
        self.session_file.save(&session)?;
        println!("Signed in as {}", session.user.email);
        self.session = Some(session);
        Ok(())
    }

    async fn open(&self, id: String) -> Result<EditorSession> {
        let session = EditorSession::edit(
            ArticleId::from(id),
            self.services.content.clone(),
            self.services.enrichment.clone(),
        );
        session.load().await?;
        Ok(session)
    }

    async fn list(&self, filter: &ArticleFilter) -> Result<()> {
        let list = ListMutationCoordinator::new(self.services.content.clone());
        let count = list.load(filter).await?;
        if count == 0 {
            println!("No articles found");
        }
        for article in list.items() {
            print_row(&article);
        }
        Ok(())
    }

    async fn search(&self, category: Option<Category>) -> Result<()> {
        let search = SearchQueryController::new(self.services.content.clone(), SearchConfig::default());
        let mut rx = search.subscribe();
        let mut input = Input::stdin();
        println!("Type a query and press enter. Ctrl-D quits.");

        search.set_criteria(SearchCriteria::new("", category));
        let mut shown = 0;
        loop {
            tokio::select! {
                line = input.line() => match line? {
                    Some(query) => {
                        search.set_criteria(SearchCriteria::new(query.trim(), category));
                    }
                    None => break,
                },
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snap = rx.borrow_and_update().clone();
                    if is_fresh(&snap, shown) {
                        shown = snap.results_epoch;
                        print_results(&snap);
                    }
                }
            }
        }

        // Piped input ends before the last query has been answered.
        let snap = rx
            .wait_for(|snap| !snap.is_loading() && snap.results_epoch == snap.epoch)
            .await?
            .clone();
        if is_fresh(&snap, shown) {
            print_results(&snap);
        }
        Ok(())
    }

    async fn show(&self, id: ArticleId, similar: bool) -> Result<()> {
        let article = self.services.content.get(&id).await?;
        print_article(&article);
        if similar {
            let related = self.services.content.similar(&id).await?;
            println!();
            if related.is_empty() {
                println!("No similar articles");
            } else {
                println!("Similar articles:");
                for article in &related {
                    print_row(article);
                }
            }
        }
        Ok(())
    }

    async fn delete(&self, id: ArticleId, yes: bool) -> Result<()> {
        let article = self.services.content.get(&id).await?;
        let list = ListMutationCoordinator::with_items(self.services.content.clone(), vec![article]);
        match list.delete(&id, &TerminalConfirm { assume_yes: yes }).await? {
            DeleteOutcome::Deleted => println!("Deleted {}", id),
            DeleteOutcome::Declined => println!("Kept {}", id),
        }
        Ok(())
    }
}

fn is_fresh(snap: &SearchSnapshot, shown: u64) -> bool {
    !snap.is_loading() && snap.results_epoch == snap.epoch && snap.results_epoch != shown
}

/// Prompt loop of the editor: fill the draft, optionally run AI transforms,
/// then save or quit.
async fn compose(session: &EditorSession) -> Result<()> {
    let mut input = Input::stdin();
    fill_draft(session, &mut input).await?;
    loop {
        let Some(choice) = input.ask("[s]ave, [e]dit, [i]mprove, [p]rompt or [q]uit").await? else {
            bail!("Input ended before the article was saved");
        };
        match choice.to_lowercase().as_str() {
            "" | "s" | "save" => match session.submit().await {
                Ok(report) => {
                    print_report(&report);
                    return Ok(());
                }
                Err(EditorError::Validation(err)) => {
                    println!("⚠️ {}", err);
                    fill_draft(session, &mut input).await?;
                }
                Err(err) => println!("❌ {}", err),
            },
            "e" | "edit" => fill_draft(session, &mut input).await?,
            "i" | "improve" => show_transform(session.improve().await),
            "p" | "prompt" => {
                let instruction = input.ask_or_keep("Instruction", &session.draft().prompt).await?;
                session.set_prompt(instruction)?;
                show_transform(session.apply_prompt().await);
            }
            "q" | "quit" => {
                println!("Discarded");
                return Ok(());
            }
            other => println!("Unknown choice: {}", other),
        }
    }
}

async fn fill_draft(session: &EditorSession, input: &mut Input) -> Result<()> {
    let draft = session.draft();
    let title = input.ask_or_keep("Title", &draft.title).await?;
    let content = input.ask_block("Content", &draft.content).await?;
    let summary = input
        .ask_or_keep("Summary (empty to generate one, '-' to clear)", &draft.summary)
        .await?;
    let summary = if summary == "-" { String::new() } else { summary };

    let names = Category::ALL.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(", ");
    let current = draft.category.map(|c| c.as_str()).unwrap_or_default();
    let category = loop {
        let raw = input.ask_or_keep(&format!("Category ({})", names), current).await?;
        if raw.is_empty() {
            break None;
        }
        match raw.parse::<Category>() {
            Ok(category) => break Some(category),
            Err(err) => println!("⚠️ {}", err),
        }
    };
    let tags = input.ask_or_keep("Tags (comma separated)", &draft.tags).await?;

    session.update_draft(|draft| {
        draft.title = title;
        draft.content = content;
        draft.summary = summary;
        draft.category = category;
        draft.tags = tags;
    })?;
    Ok(())
}

fn show_transform(result: Result<String, EditorError>) {
    match result {
        Ok(revised) => println!("\n{}\n", revised),
        Err(err) => println!("⚠️ {}", err),
    }
}

async fn finish_transform(session: &EditorSession, save: bool) -> Result<()> {
    if save {
        let report = session.submit().await?;
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &SubmitReport) {
    let article = &report.article;
    println!("Saved \"{}\" ({})", article.title, article.id);
    match &report.enrichment {
        EnrichmentOutcome::NotNeeded => {}
        EnrichmentOutcome::NoSummary => println!("No summary was generated"),
        EnrichmentOutcome::Applied { summary } => println!("✨ Summary: {}", summary),
        EnrichmentOutcome::Failed { message, .. } => println!("⚠️ {}", message),
    }
}

fn print_results(snap: &SearchSnapshot) {
    if let Some(error) = &snap.error {
        println!("⚠️ {}", error);
        return;
    }
    println!("── {} result(s) for \"{}\"", snap.results.len(), snap.criteria.query);
    for article in &snap.results {
        print_row(article);
    }
}

fn print_row(article: &Article) {
    let category = article.category.map(|c| c.as_str()).unwrap_or("-");
    println!(
        "{:<26} {:<40} {:<12} {}",
        article.id.as_str(),
        ellipsize(&article.title, 40),
        category,
        article.tags_string()
    );
}

fn print_article(article: &Article) {
    println!("{}", article.title);
    println!("id:       {}", article.id);
    if let Some(category) = article.category {
        println!("category: {}", category);
    }
    if !article.tags.is_empty() {
        println!("tags:     {}", article.tags_string());
    }
    if let Some(author) = &article.author {
        println!("author:   {}", author.display_name());
    }
    if let Some(created) = article.created_at {
        let edited = if article.was_updated() { " (edited)" } else { "" };
        println!("created:  {}{}", created.format("%Y-%m-%d %H:%M"), edited);
    }
    if let Some(summary) = &article.summary {
        println!("\n{}", summary);
    }
    println!("\n{}", article.content);
}
