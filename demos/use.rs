use avlset::AvlSet;

fn main() {
    let mut set: AvlSet<i32> = [5, 3, 8, 1, 4, 7, 9].into_iter().collect();
    set.insert(4);
    assert_eq!(set.len(), 7);
    set.remove(&5);
    assert!(!set.contains(&5));

    print!("{{ ");
    for x in &set {
        print!("{x}, ");
    }
    println!("}}");

    let mut cursor = set.lower_bound(&6);
    if let Some(value) = cursor.get() {
        println!("lower bound of 6: {value}");
    }

    // Keep a place in the set while it changes
    let position = cursor.position();
    for x in 10..20 {
        set.insert(x);
    }
    set.remove(&8);
    cursor = set.cursor_at(position).unwrap_or_else(|| set.end());

    print!("from 7 backwards: ");
    while let Some(value) = cursor.get() {
        print!("{value} ");
        if !cursor.move_prev() {
            break;
        }
    }
    println!();
}
