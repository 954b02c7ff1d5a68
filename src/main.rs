use clap::{Args, Parser, Subcommand};
use log::debug;
use macrochef::render::{render_comments, render_recipe, render_recipes};
use macrochef::{
    GenerationTargets, ImageSource, Macros, MacroChef, ProviderKind, Reaction,
};

#[derive(Parser)]
#[command(name = "macrochef")]
#[command(about = "Recipes that hit your macros, from the community, your saves and AI", long_about = None)]
struct Cli {
    /// Generation provider (google, openai, anthropic); defaults to the configured one
    #[arg(long, global = true, value_parser = parse_provider)]
    provider: Option<ProviderKind>,

    /// Model name for the selected provider
    #[arg(long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Suggest three recipes for the given ingredients
    Generate(GenerateArgs),
    /// Show the most liked community recipes
    Community,
    /// Show your saved recipes
    Saved,
    /// Save a community recipe to your collection
    Save { id: String },
    /// Like a community recipe (again to withdraw)
    Like { id: String },
    /// Dislike a community recipe (again to withdraw)
    Dislike { id: String },
    /// Comment on a community recipe
    Comment { id: String, text: String },
    /// Show the latest comments of a recipe
    Comments { id: String },
}

#[derive(Args)]
struct GenerateArgs {
    /// Comma-separated ingredients, e.g. "chicken, rice, broccoli"
    #[arg(required_unless_present = "image")]
    ingredients: Option<String>,

    /// Photo of your ingredients; detected ingredients are used instead of text
    #[arg(long)]
    image: Option<String>,

    #[arg(long, default_value_t = 500.0)]
    calories: f64,
    #[arg(long, default_value_t = 40.0)]
    protein: f64,
    #[arg(long, default_value_t = 50.0)]
    carbs: f64,
    #[arg(long, default_value_t = 15.0)]
    fat: f64,

    /// breakfast, lunch, dinner, snack or any
    #[arg(long, default_value = "any")]
    meal_type: String,
    #[arg(long, default_value = "any")]
    cuisine: String,
    /// Dietary restrictions, e.g. "vegetarian"
    #[arg(long, default_value = "")]
    dietary: String,
    /// Ingredients to avoid
    #[arg(long, default_value = "")]
    exclude: String,
}

impl GenerateArgs {
    fn targets(&self) -> GenerationTargets {
        GenerationTargets {
            macros: Macros {
                calories: self.calories,
                protein: self.protein,
                carbs: self.carbs,
                fat: self.fat,
            },
            meal_type: self.meal_type.clone(),
            cuisine: self.cuisine.clone(),
            dietary: self.dietary.clone(),
            exclude: self.exclude.clone(),
        }
    }
}

fn parse_provider(name: &str) -> Result<ProviderKind, String> {
    match name {
        "google" => Ok(ProviderKind::Google),
        "openai" => Ok(ProviderKind::OpenAI),
        "anthropic" => Ok(ProviderKind::Anthropic),
        _ => Err(format!("Unknown provider: {}", name)),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let mut builder = MacroChef::builder();
    if let Some(provider) = cli.provider {
        builder = builder.provider(provider);
    }
    if let Some(model) = cli.model {
        builder = builder.model(model);
    }
    let mut chef = builder.build().await?;
    println!("{}", chef.session().status());

    match cli.command {
        Commands::Generate(args) => {
            let ingredients = match &args.image {
                Some(path) => {
                    let found = chef
                        .ingredients_from_image(ImageSource::Path(path.clone()))
                        .await?;
                    println!("Detected ingredients: {}", found.join(", "));
                    found.join(", ")
                }
                None => args.ingredients.clone().unwrap_or_default(),
            };
            let recipes = chef.generate(&ingredients, args.targets()).await?;
            print!("{}", render_recipes(recipes));
        }
        Commands::Community => {
            let recipes = chef.show_community().await?;
            print!("{}", render_recipes(recipes));
        }
        Commands::Saved => {
            let recipes = chef.show_saved().await?;
            print!("{}", render_recipes(recipes));
        }
        Commands::Save { id } => {
            let recipe = chef.save_by_id(&id).await?;
            println!("Recipe saved!");
            print!("{}", render_recipe(&recipe));
        }
        Commands::Like { id } => {
            let tally = chef.react(&id, Reaction::Like).await?;
            println!("Likes: {}  Dislikes: {}", tally.likes, tally.dislikes);
        }
        Commands::Dislike { id } => {
            let tally = chef.react(&id, Reaction::Dislike).await?;
            println!("Likes: {}  Dislikes: {}", tally.likes, tally.dislikes);
        }
        Commands::Comment { id, text } => {
            let comment = chef.comment(&id, &text).await?;
            debug!("Posted {:?}", comment);
            print!("{}", render_comments(&chef.recent_comments(&id).await?));
        }
        Commands::Comments { id } => {
            print!("{}", render_comments(&chef.recent_comments(&id).await?));
        }
    }

    chef.shutdown();
    Ok(())
}
