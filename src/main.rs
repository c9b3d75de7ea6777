use async_requests::Session;
use std::time::Instant;


fn main() {
    let urls = [
        "https://example.com",
        "https://www.rust-lang.org",
        "https://httpbin.org/get",
    ];

    let now = Instant::now();
    let session = Session::new();

    let handles: Vec<_> = urls.iter().map(|url| session.get(*url).send()).collect();

    for (url, dispatched) in urls.iter().zip(handles) {
        match dispatched {
            Ok(handle) => match handle.wait() {
                Ok(resp) => println!("{url} -> {} ok={}", resp.status, resp.is_success()),
                Err(e) => println!("{url} -> error: {e}"),
            },
            Err(e) => println!("{url} -> dispatch error: {e}"),
        }
    }

    session.close();
    println!("elapsed: {:?}", now.elapsed());
}
